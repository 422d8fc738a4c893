//! External collaborator interfaces
//!
//! The audit core does not own identity, device discovery, or remote
//! delivery. Those live behind these traits and are injected into the
//! service, which keeps the core testable in isolation and avoids
//! module-level singletons.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::entry::{ActorContext, AuditLogEntry, DeviceInfo};
use crate::error::AuditError;

/// Supplies the identity context of the current caller
pub trait SessionProvider: Send + Sync {
    fn current_actor(&self) -> ActorContext;
}

/// Supplies device/platform context for the record
pub trait DeviceInfoProvider: Send + Sync {
    fn device_info(&self) -> DeviceInfo;
}

/// Remote escalation sink for critical-risk entries.
///
/// Delivery is fire-and-forget: a failure is logged by the service and never
/// surfaces to the caller. There is no acknowledgment or retry contract.
#[async_trait]
pub trait CriticalEventSink: Send + Sync {
    async fn send_critical(&self, entry: &AuditLogEntry) -> Result<(), AuditError>;
}

/// Durable compliance store the local buffer forwards into.
///
/// Forwarding is best-effort: the local store evicts regardless of the
/// outcome, and a failure is logged rather than propagated.
#[async_trait]
pub trait ComplianceForwarder: Send + Sync {
    async fn forward(&self, entry: &AuditLogEntry) -> Result<(), AuditError>;
}

/// Session provider with a fixed actor, for single-session clients and tests
pub struct StaticSessionProvider {
    actor: ActorContext,
}

impl StaticSessionProvider {
    pub fn new(actor: ActorContext) -> Self {
        Self { actor }
    }
}

impl SessionProvider for StaticSessionProvider {
    fn current_actor(&self) -> ActorContext {
        self.actor.clone()
    }
}

/// Device provider with fixed platform info
pub struct StaticDeviceInfoProvider {
    info: DeviceInfo,
}

impl StaticDeviceInfoProvider {
    pub fn new(info: DeviceInfo) -> Self {
        Self { info }
    }
}

impl DeviceInfoProvider for StaticDeviceInfoProvider {
    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }
}

/// In-process critical sink that records what it was asked to deliver.
///
/// Can be switched into a failing mode to exercise the fire-and-forget path.
#[derive(Default)]
pub struct RecordingCriticalSink {
    sent: Mutex<Vec<AuditLogEntry>>,
    fail_next: AtomicBool,
}

impl RecordingCriticalSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent delivery fail
    pub fn set_failing(&self, failing: bool) {
        self.fail_next.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<AuditLogEntry> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl CriticalEventSink for RecordingCriticalSink {
    async fn send_critical(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        if self.fail_next.load(Ordering::SeqCst) {
            return Err(AuditError::CriticalDelivery("sink unavailable".into()));
        }
        self.sent.lock().await.push(entry.clone());
        Ok(())
    }
}

/// Forwarder that records forwarded entries, for tests and local wiring
#[derive(Default)]
pub struct RecordingForwarder {
    forwarded: Mutex<Vec<AuditLogEntry>>,
}

impl RecordingForwarder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn forwarded(&self) -> Vec<AuditLogEntry> {
        self.forwarded.lock().await.clone()
    }
}

#[async_trait]
impl ComplianceForwarder for RecordingForwarder {
    async fn forward(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        self.forwarded.lock().await.push(entry.clone());
        Ok(())
    }
}

/// Forwarder that accepts and discards everything
pub struct NoopForwarder;

#[async_trait]
impl ComplianceForwarder for NoopForwarder {
    async fn forward(&self, _entry: &AuditLogEntry) -> Result<(), AuditError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EntryBuilder;
    use crate::classify::AuditEventType;
    use crate::entry::EntryDetails;

    fn sample_entry() -> AuditLogEntry {
        EntryBuilder::new().build(
            AuditEventType::EmergencyAlert,
            EntryDetails::new(),
            &ActorContext::new("nurse-7", "nurse", "sess-1"),
        )
    }

    #[test]
    fn static_session_provider_returns_actor() {
        let provider = StaticSessionProvider::new(ActorContext::new("admin-1", "admin", "sess-9"));
        let actor = provider.current_actor();
        assert_eq!(actor.actor_id, "admin-1");
        assert_eq!(actor.actor_role, "admin");
    }

    #[tokio::test]
    async fn recording_sink_records_deliveries() {
        let sink = RecordingCriticalSink::new();
        sink.send_critical(&sample_entry()).await.unwrap();
        assert_eq!(sink.sent_count().await, 1);
    }

    #[tokio::test]
    async fn recording_sink_failing_mode() {
        let sink = RecordingCriticalSink::new();
        sink.set_failing(true);
        let err = sink.send_critical(&sample_entry()).await.unwrap_err();
        assert!(matches!(err, AuditError::CriticalDelivery(_)));
        assert_eq!(sink.sent_count().await, 0);
    }

    #[tokio::test]
    async fn recording_forwarder_keeps_entries() {
        let forwarder = RecordingForwarder::new();
        forwarder.forward(&sample_entry()).await.unwrap();
        assert_eq!(forwarder.forwarded().await.len(), 1);
    }
}
