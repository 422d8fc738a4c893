//! Error types for the audit core
//!
//! Write-path failures (`Serialization`, `StorageWrite`) are recovered inside
//! the service by routing to the fallback logger, so callers of `log()` never
//! see them. Read-path failures surface as explicit `Err` results so callers
//! can retry. An integrity mismatch is a distinct signal: the entry still
//! exists, its checksum just no longer matches.

use thiserror::Error;

/// Top-level error type for the audit subsystem
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage write error: {0}")]
    StorageWrite(String),

    #[error("Storage read error: {0}")]
    StorageRead(String),

    #[error("Integrity mismatch for entry {id}")]
    IntegrityMismatch { id: String },

    #[error("Critical event delivery failed: {0}")]
    CriticalDelivery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
