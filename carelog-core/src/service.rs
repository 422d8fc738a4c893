//! Audit service orchestration
//!
//! `AuditService` is the surface the rest of the application talks to. It is
//! constructed from injected collaborators, never module state. The one rule
//! it enforces everywhere: a failure in this subsystem must never abort the
//! primary action being audited, so `log()` cannot return an error or panic;
//! it reports success or fallback through [`LogOutcome`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::EntryBuilder;
use crate::classify::{AuditEventType, ComplianceCategory, RiskLevel};
use crate::config::AuditConfig;
use crate::entry::{AuditLogEntry, EntryDetails};
use crate::error::AuditError;
use crate::export::{self, ExportPayload};
use crate::fallback::{FallbackLogger, FallbackRecord};
use crate::integrity;
use crate::providers::{CriticalEventSink, DeviceInfoProvider, SessionProvider};
use crate::report::ComplianceReport;
use crate::store::{AuditQuery, AuditStore};

/// Observable result of a `log()` call
#[derive(Debug, Clone)]
pub enum LogOutcome {
    /// Entry persisted in the primary store
    Logged(AuditLogEntry),
    /// Primary write failed; a fallback record was written instead
    FellBack {
        event_type: AuditEventType,
        error: String,
    },
}

impl LogOutcome {
    pub fn is_logged(&self) -> bool {
        matches!(self, Self::Logged(_))
    }

    pub fn entry(&self) -> Option<&AuditLogEntry> {
        match self {
            Self::Logged(entry) => Some(entry),
            Self::FellBack { .. } => None,
        }
    }
}

/// Result of a bulk integrity verification sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegritySweep {
    pub checked: usize,
    /// Ids of entries whose checksum no longer matches. These entries still
    /// exist in the store; they are flagged, not dropped.
    pub mismatched: Vec<String>,
}

impl IntegritySweep {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty()
    }
}

/// Compliance audit service
pub struct AuditService<S: AuditStore> {
    store: Arc<S>,
    session: Arc<dyn SessionProvider>,
    device: Arc<dyn DeviceInfoProvider>,
    critical_sink: Arc<dyn CriticalEventSink>,
    builder: EntryBuilder,
    fallback: FallbackLogger,
    config: AuditConfig,
}

impl<S: AuditStore> AuditService<S> {
    pub fn new(
        store: Arc<S>,
        session: Arc<dyn SessionProvider>,
        device: Arc<dyn DeviceInfoProvider>,
        critical_sink: Arc<dyn CriticalEventSink>,
        config: AuditConfig,
    ) -> Self {
        let fallback = FallbackLogger::new(config.fallback_capacity);
        Self {
            store,
            session,
            device,
            critical_sink,
            builder: EntryBuilder::new(),
            fallback,
            config,
        }
    }

    /// Replace the entry builder, e.g. to inject a fixed clock
    pub fn with_builder(mut self, builder: EntryBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Record a sensitive action.
    ///
    /// Classifies, builds an immutable entry, and appends it to the primary
    /// store. On any write-path failure the event is routed to the fallback
    /// sink and the caller gets `FellBack`; this method never returns an
    /// error. Critical-risk entries are additionally handed to the critical
    /// sink, fire-and-forget.
    pub async fn log(&self, event_type: AuditEventType, details: EntryDetails) -> LogOutcome {
        let actor = self.session.current_actor();

        let mut details = details;
        if let Err(err) = self.device.device_info().apply_to(&mut details) {
            let error = err.to_string();
            self.fallback.record(event_type, details, &error).await;
            return LogOutcome::FellBack { event_type, error };
        }

        let entry = self.builder.build(event_type, details, &actor);

        match self.store.append(entry.clone()).await {
            Ok(()) => {
                if entry.risk_level == RiskLevel::Critical {
                    if let Err(err) = self.critical_sink.send_critical(&entry).await {
                        // No acknowledgment or retry contract; log and move on
                        warn!(entry_id = %entry.id, %err, "critical event delivery failed");
                    }
                }
                LogOutcome::Logged(entry)
            }
            Err(err) => {
                let error = err.to_string();
                self.fallback
                    .record(event_type, entry.details.clone(), &error)
                    .await;
                LogOutcome::FellBack { event_type, error }
            }
        }
    }

    /// Filtered, newest-first view of the audit log
    pub async fn get_logs(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.store.query(query).await
    }

    /// Aggregate one compliance category over an inclusive period
    pub async fn compliance_report(
        &self,
        category: ComplianceCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ComplianceReport, AuditError> {
        let snapshot = self.store.snapshot().await?;
        Ok(ComplianceReport::build(category, start, end, snapshot))
    }

    /// Export a filtered snapshot, then audit the export itself.
    ///
    /// The snapshot is taken first, so the `data_export` entry this call
    /// records is deliberately absent from the payload it describes.
    pub async fn export_logs(&self, query: &AuditQuery) -> Result<ExportPayload, AuditError> {
        let entries = self.store.query(query).await?;
        let actor = self.session.current_actor();
        let payload = ExportPayload::new(actor.actor_id, entries);

        let details = match export::export_details(query, payload.entry_count) {
            Ok(details) => details,
            Err(err) => {
                warn!(%err, "could not summarize export filter, recording bare export event");
                EntryDetails::new()
            }
        };
        self.log(AuditEventType::DataExport, details).await;

        Ok(payload)
    }

    /// Purge entries past the retention window, returning the purged count
    pub async fn clean_old_logs(&self) -> Result<usize, AuditError> {
        self.store
            .purge_expired(Utc::now(), self.config.retention_days)
            .await
    }

    /// Check one entry's checksum against its protected fields
    pub fn verify_entry(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        if integrity::verify(entry) {
            Ok(())
        } else {
            Err(AuditError::IntegrityMismatch {
                id: entry.id.clone(),
            })
        }
    }

    /// Verify every stored entry. Mismatched entries are reported, never
    /// removed.
    pub async fn verify_all(&self) -> Result<IntegritySweep, AuditError> {
        let snapshot = self.store.snapshot().await?;
        let checked = snapshot.len();
        let mismatched: Vec<String> = snapshot
            .into_iter()
            .filter(|entry| !integrity::verify(entry))
            .map(|entry| {
                warn!(entry_id = %entry.id, "audit entry failed integrity verification");
                entry.id
            })
            .collect();

        Ok(IntegritySweep { checked, mismatched })
    }

    /// Records captured by the fallback sink
    pub async fn fallback_records(&self) -> Vec<FallbackRecord> {
        self.fallback.records().await
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }
}
