//! Append-only audit log stores
//!
//! The store is the one component that sees concurrent writers, so every
//! mutation happens under a single write lock; there is no read-modify-write
//! of the whole list anywhere. Reads hand out snapshots so reporting and
//! retention never iterate a live, mutating collection.
//!
//! `MemoryAuditStore` is a bounded client-resident buffer, not the system of
//! record: entries evicted by the ring buffer are handed to a
//! [`ComplianceForwarder`] on a best-effort basis. `JsonFileAuditStore`
//! persists the same semantics to a local JSON file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::classify::{AuditEventType, ComplianceCategory, RiskLevel};
use crate::entry::AuditLogEntry;
use crate::error::AuditError;
use crate::providers::ComplianceForwarder;
use crate::retention;

/// Filter for querying the audit log.
///
/// All populated fields AND-combine; the timestamp range is inclusive on
/// both ends. Results are newest-first and paginated via `limit`/`offset`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    pub event_type: Option<AuditEventType>,
    pub actor_id: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub category: Option<ComplianceCategory>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Max results; `None` returns every match
    pub limit: Option<usize>,
    pub offset: usize,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    pub fn with_category(mut self, category: ComplianceCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an entry satisfies every populated filter field
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(event_type) = self.event_type {
            if entry.event_type != event_type {
                return false;
            }
        }
        if let Some(actor_id) = &self.actor_id {
            if &entry.actor_id != actor_id {
                return false;
            }
        }
        if let Some(risk_level) = self.risk_level {
            if entry.risk_level != risk_level {
                return false;
            }
        }
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }
        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Append-only, queryable, retention-bounded audit store
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a single entry. Atomic under concurrent invocation.
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError>;

    /// Filtered, newest-first, paginated view
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError>;

    /// Point-in-time copy of every entry, oldest-first
    async fn snapshot(&self) -> Result<Vec<AuditLogEntry>, AuditError>;

    /// Remove entries older than the retention window, returning the count
    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<usize, AuditError>;

    /// Number of stored entries
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn filter_newest_first<'a>(
    entries: impl Iterator<Item = &'a AuditLogEntry>,
    query: &AuditQuery,
) -> Vec<AuditLogEntry> {
    let mut matched: Vec<_> = entries.filter(|e| query.matches(e)).cloned().collect();
    matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let matched = matched.into_iter().skip(query.offset);
    match query.limit {
        Some(limit) => matched.take(limit).collect(),
        None => matched.collect(),
    }
}

/// In-memory ring buffer of the most recent entries.
///
/// Bounded local capping is not the legal retention window: an entry evicted
/// here is handed to the forwarder so the durable compliance store still has
/// it. Forwarding is best-effort and never fails the append.
pub struct MemoryAuditStore {
    entries: RwLock<VecDeque<AuditLogEntry>>,
    max_entries: usize,
    forwarder: Option<Arc<dyn ComplianceForwarder>>,
}

impl MemoryAuditStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: max_entries.max(1),
            forwarder: None,
        }
    }

    /// Attach a durable forwarder for evicted entries
    pub fn with_forwarder(mut self, forwarder: Arc<dyn ComplianceForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let evicted = {
            let mut entries = self.entries.write().await;
            let evicted = if entries.len() >= self.max_entries {
                entries.pop_front()
            } else {
                None
            };
            entries.push_back(entry);
            evicted
        };

        if let Some(evicted) = evicted {
            if let Some(forwarder) = &self.forwarder {
                if let Err(err) = forwarder.forward(&evicted).await {
                    warn!(entry_id = %evicted.id, %err, "failed to forward evicted audit entry");
                }
            } else {
                warn!(entry_id = %evicted.id, "audit entry evicted with no forwarder attached");
            }
        }
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self.entries.read().await;
        Ok(filter_newest_first(entries.iter(), query))
    }

    async fn snapshot(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().cloned().collect())
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<usize, AuditError> {
        let mut entries = self.entries.write().await;
        let taken: Vec<_> = std::mem::take(&mut *entries).into();
        let (survivors, purged) = retention::purge(taken, now, retention_days);
        *entries = survivors.into();
        if purged > 0 {
            debug!(purged, "purged expired audit entries");
        }
        Ok(purged)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// File-backed audit store.
///
/// Loads on open, persists after every mutation. The durable local variant
/// for clients that can write to disk; read or parse failures surface as
/// `StorageRead` so callers can retry instead of crashing.
#[derive(Debug)]
pub struct JsonFileAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
    file_path: PathBuf,
}

impl JsonFileAuditStore {
    /// Open the store at `dir/audit_log.json`, creating an empty store when
    /// the file does not exist yet
    pub async fn open(dir: &Path) -> Result<Self, AuditError> {
        let file_path = dir.join("audit_log.json");

        let entries = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .await
                .map_err(|e| AuditError::StorageRead(format!("failed to read audit log: {e}")))?;
            serde_json::from_str(&content)
                .map_err(|e| AuditError::StorageRead(format!("failed to parse audit log: {e}")))?
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            file_path,
        })
    }

    async fn persist(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AuditError::StorageWrite(format!("failed to create log dir: {e}")))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        fs::write(&self.file_path, content)
            .await
            .map_err(|e| AuditError::StorageWrite(format!("failed to write audit log: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl AuditStore for JsonFileAuditStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        if let Err(err) = self.persist(&entries).await {
            // A failed append must leave no trace: the caller records a
            // fallback instead, and keeping the entry here would double-record
            // the action on the next successful persist
            entries.pop();
            return Err(err);
        }
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self.entries.read().await;
        Ok(filter_newest_first(entries.iter(), query))
    }

    async fn snapshot(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        Ok(self.entries.read().await.clone())
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<usize, AuditError> {
        let mut entries = self.entries.write().await;
        let taken = std::mem::take(&mut *entries);
        let (survivors, purged) = retention::purge(taken, now, retention_days);
        *entries = survivors;
        if purged > 0 {
            self.persist(&entries).await?;
            debug!(purged, "purged expired audit entries from file store");
        }
        Ok(purged)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Store wrapper whose appends can be forced to fail, for exercising the
/// fallback path
pub struct FailingStore<S> {
    inner: S,
    fail_appends: AtomicBool,
}

impl<S: AuditStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_appends: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: AuditStore> AuditStore for FailingStore<S> {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AuditError::StorageWrite("append disabled".into()));
        }
        self.inner.append(entry).await
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.inner.query(query).await
    }

    async fn snapshot(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.inner.snapshot().await
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<usize, AuditError> {
        self.inner.purge_expired(now, retention_days).await
    }

    async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EntryBuilder;
    use crate::entry::{ActorContext, DetailValue, EntryDetails};
    use crate::providers::RecordingForwarder;
    use chrono::Duration;
    use tempfile::tempdir;

    fn actor() -> ActorContext {
        ActorContext::new("nurse-7", "nurse", "sess-1")
    }

    fn entry(event_type: AuditEventType) -> AuditLogEntry {
        EntryBuilder::new().build(event_type, EntryDetails::new(), &actor())
    }

    fn entry_for(actor_id: &str, event_type: AuditEventType) -> AuditLogEntry {
        EntryBuilder::new().build(
            event_type,
            EntryDetails::new(),
            &ActorContext::new(actor_id, "nurse", "sess-1"),
        )
    }

    fn entry_at(stamp: DateTime<Utc>) -> AuditLogEntry {
        EntryBuilder::with_clock(move || stamp).build(
            AuditEventType::NoteAdded,
            EntryDetails::new(),
            &actor(),
        )
    }

    #[tokio::test]
    async fn append_and_snapshot() {
        let store = MemoryAuditStore::new(10);
        store.append(entry(AuditEventType::StaffLogin)).await.unwrap();
        store.append(entry(AuditEventType::NoteAdded)).await.unwrap();

        assert_eq!(store.len().await, 2);
        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].event_type, AuditEventType::StaffLogin);
    }

    #[tokio::test]
    async fn query_filters_and_combine() {
        let store = MemoryAuditStore::new(10);
        store
            .append(entry_for("nurse-7", AuditEventType::MedicationAdministered))
            .await
            .unwrap();
        store
            .append(entry_for("nurse-8", AuditEventType::MedicationAdministered))
            .await
            .unwrap();
        store
            .append(entry_for("nurse-7", AuditEventType::StaffLogin))
            .await
            .unwrap();

        let query = AuditQuery::new()
            .with_actor("nurse-7")
            .with_event_type(AuditEventType::MedicationAdministered);
        let results = store.query(&query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].actor_id, "nurse-7");

        let query = AuditQuery::new().with_risk_level(RiskLevel::High);
        assert_eq!(store.query(&query).await.unwrap().len(), 2);

        let query = AuditQuery::new().with_category(ComplianceCategory::StaffManagement);
        assert_eq!(store.query(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn query_is_newest_first_with_inclusive_range() {
        let store = MemoryAuditStore::new(10);
        let base: DateTime<Utc> = "2026-03-01T12:00:00Z".parse().unwrap();
        let early = entry_at(base);
        let middle = entry_at(base + Duration::hours(1));
        let late = entry_at(base + Duration::hours(2));

        // Insert out of order; query must still sort by timestamp
        store.append(middle.clone()).await.unwrap();
        store.append(late.clone()).await.unwrap();
        store.append(early.clone()).await.unwrap();

        let results = store.query(&AuditQuery::new()).await.unwrap();
        let ids: Vec<_> = results.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![late.id.as_str(), middle.id.as_str(), early.id.as_str()]);

        // Inclusive on both ends
        let query = AuditQuery::new().with_range(early.timestamp, middle.timestamp);
        let results = store.query(&query).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, middle.id);
    }

    #[tokio::test]
    async fn query_pagination() {
        let store = MemoryAuditStore::new(10);
        for _ in 0..5 {
            store.append(entry(AuditEventType::NoteAdded)).await.unwrap();
        }

        let query = AuditQuery {
            limit: Some(2),
            offset: 0,
            ..Default::default()
        };
        assert_eq!(store.query(&query).await.unwrap().len(), 2);

        let query = AuditQuery {
            limit: Some(2),
            offset: 4,
            ..Default::default()
        };
        assert_eq!(store.query(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ring_buffer_evicts_to_forwarder() {
        let forwarder = RecordingForwarder::new();
        let store = MemoryAuditStore::new(2).with_forwarder(forwarder.clone());

        let first = entry(AuditEventType::StaffLogin);
        let first_id = first.id.clone();
        store.append(first).await.unwrap();
        store.append(entry(AuditEventType::NoteAdded)).await.unwrap();
        store.append(entry(AuditEventType::NoteAdded)).await.unwrap();

        assert_eq!(store.len().await, 2);
        let forwarded = forwarder.forwarded().await;
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].id, first_id);
    }

    #[tokio::test]
    async fn purge_expired_removes_old_entries() {
        let store = MemoryAuditStore::new(10);
        let now = Utc::now();
        store.append(entry_at(now - Duration::days(3000))).await.unwrap();
        store.append(entry_at(now - Duration::days(1))).await.unwrap();

        let purged = store.purge_expired(now, 2555).await.unwrap();
        assert_eq!(purged, 1);
        assert_eq!(store.len().await, 1);

        // Second sweep finds nothing
        assert_eq!(store.purge_expired(now, 2555).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_store_persists_across_open() {
        let dir = tempdir().unwrap();

        {
            let store = JsonFileAuditStore::open(dir.path()).await.unwrap();
            let mut details = EntryDetails::new();
            details.insert("resident_id", "r1").unwrap();
            let entry = EntryBuilder::new().build(
                AuditEventType::MedicationAdministered,
                details,
                &actor(),
            );
            store.append(entry).await.unwrap();
        }

        let store = JsonFileAuditStore::open(dir.path()).await.unwrap();
        assert_eq!(store.len().await, 1);
        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(
            snapshot[0].details.get("resident_id"),
            Some(&DetailValue::Str("r1".into()))
        );
        assert!(crate::integrity::verify(&snapshot[0]));
    }

    #[tokio::test]
    async fn file_store_failed_append_leaves_no_entry_behind() {
        let dir = tempdir().unwrap();
        let store = JsonFileAuditStore::open(dir.path()).await.unwrap();

        // A directory at the log path makes every persist fail
        tokio::fs::create_dir(dir.path().join("audit_log.json"))
            .await
            .unwrap();

        let err = store.append(entry(AuditEventType::NoteAdded)).await.unwrap_err();
        assert!(matches!(err, AuditError::StorageWrite(_)));

        // The failed entry must not remain queryable or be smuggled into the
        // file by a later successful append
        assert_eq!(store.len().await, 0);
        assert!(store.query(&AuditQuery::new()).await.unwrap().is_empty());

        tokio::fs::remove_dir(dir.path().join("audit_log.json"))
            .await
            .unwrap();
        store.append(entry(AuditEventType::StaffLogin)).await.unwrap();

        let reopened = JsonFileAuditStore::open(dir.path()).await.unwrap();
        let snapshot = reopened.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].event_type, AuditEventType::StaffLogin);
    }

    #[tokio::test]
    async fn file_store_surfaces_corrupt_content_as_read_error() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("audit_log.json"), "{ not json")
            .await
            .unwrap();

        let err = JsonFileAuditStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, AuditError::StorageRead(_)));
    }

    #[tokio::test]
    async fn failing_store_rejects_appends_when_enabled() {
        let store = FailingStore::new(MemoryAuditStore::new(10));
        store.append(entry(AuditEventType::NoteAdded)).await.unwrap();

        store.set_failing(true);
        let err = store.append(entry(AuditEventType::NoteAdded)).await.unwrap_err();
        assert!(matches!(err, AuditError::StorageWrite(_)));
        assert_eq!(store.len().await, 1);
    }
}
