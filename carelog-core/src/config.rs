//! Audit subsystem configuration

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::retention::DEFAULT_RETENTION_DAYS;

/// Configuration for the audit service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Capacity of the client-resident ring buffer
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Legal retention window in days
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Capacity of the fallback sink
    #[serde(default = "default_fallback_capacity")]
    pub fallback_capacity: usize,
}

fn default_max_entries() -> usize {
    10_000
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

fn default_fallback_capacity() -> usize {
    100
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            retention_days: default_retention_days(),
            fallback_capacity: default_fallback_capacity(),
        }
    }
}

impl AuditConfig {
    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> Result<Self, AuditError> {
        toml::from_str(content).map_err(|e| AuditError::Config(e.to_string()))
    }
}
