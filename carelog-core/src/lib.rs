//! carelog-core: compliance audit logging for the carelog nursing-home app
//!
//! This crate provides the audit/compliance subsystem:
//!
//! - **Classification** - [`classify`] maps every event type to a risk level
//!   and compliance category via static tables
//! - **Immutable entries** - [`EntryBuilder`] assembles [`AuditLogEntry`]
//!   records with a SHA-256 checksum over their protected fields
//! - **Stores** - the [`AuditStore`] trait with [`MemoryAuditStore`] (bounded
//!   ring buffer with best-effort forwarding) and [`JsonFileAuditStore`]
//! - **Retention** - pure purge over a roughly seven-year window
//! - **Reporting and export** - [`ComplianceReport`] aggregation and
//!   [`ExportPayload`] snapshots that audit themselves
//! - **Fallback** - a bounded secondary sink used only when the primary
//!   write fails, so audit logging can never break the action it audits
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use carelog_core::{
//!     ActorContext, AuditConfig, AuditEventType, AuditService, DeviceInfo, EntryDetails,
//!     MemoryAuditStore, RecordingCriticalSink, StaticDeviceInfoProvider, StaticSessionProvider,
//! };
//!
//! # async fn example() {
//! let service = AuditService::new(
//!     Arc::new(MemoryAuditStore::new(10_000)),
//!     Arc::new(StaticSessionProvider::new(ActorContext::new("nurse-7", "nurse", "sess-1"))),
//!     Arc::new(StaticDeviceInfoProvider::new(DeviceInfo::default())),
//!     RecordingCriticalSink::new(),
//!     AuditConfig::default(),
//! );
//!
//! let mut details = EntryDetails::new();
//! details.insert("resident_id", "r1").unwrap();
//! let outcome = service.log(AuditEventType::MedicationAdministered, details).await;
//! assert!(outcome.is_logged());
//! # }
//! ```

pub mod builder;
pub mod classify;
pub mod config;
pub mod entry;
pub mod error;
pub mod export;
pub mod fallback;
pub mod integrity;
pub mod providers;
pub mod report;
pub mod retention;
pub mod service;
pub mod store;

// Re-export key types for convenience
pub use builder::EntryBuilder;
pub use classify::{AuditEventType, Classification, ComplianceCategory, RiskLevel, classify};
pub use config::AuditConfig;
pub use entry::{ActorContext, AuditLogEntry, DetailValue, DeviceInfo, EntryDetails};
pub use error::AuditError;
pub use export::ExportPayload;
pub use fallback::{FallbackLogger, FallbackRecord};
pub use providers::{
    ComplianceForwarder, CriticalEventSink, DeviceInfoProvider, NoopForwarder,
    RecordingCriticalSink, RecordingForwarder, SessionProvider, StaticDeviceInfoProvider,
    StaticSessionProvider,
};
pub use report::{ComplianceReport, UserActivity};
pub use retention::{DEFAULT_RETENTION_DAYS, purge};
pub use service::{AuditService, IntegritySweep, LogOutcome};
pub use store::{AuditQuery, AuditStore, FailingStore, JsonFileAuditStore, MemoryAuditStore};
