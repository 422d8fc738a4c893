//! Best-effort secondary sink for failed primary writes
//!
//! Used only when the primary store rejects an append. The guarantee is a
//! best-effort attempt, not delivery: records live in a bounded in-memory
//! buffer trimmed to the most recent `capacity`, and a record pushed out of
//! that window is gone. That weaker guarantee is accepted by design.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use crate::classify::AuditEventType;
use crate::entry::EntryDetails;

/// Minimal record of a failed primary write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub timestamp: DateTime<Utc>,
    /// Event type of the entry that failed to persist
    pub event_type: AuditEventType,
    pub error: String,
    pub details: EntryDetails,
}

/// Bounded secondary sink; recording never fails
pub struct FallbackLogger {
    records: RwLock<VecDeque<FallbackRecord>>,
    capacity: usize,
}

impl FallbackLogger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a failed write. Trims to the most recent `capacity` records.
    pub async fn record(&self, event_type: AuditEventType, details: EntryDetails, error: &str) {
        warn!(event_type = event_type.as_str(), error, "primary audit write failed, using fallback");

        let mut records = self.records.write().await;
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(FallbackRecord {
            timestamp: Utc::now(),
            event_type,
            error: error.to_string(),
            details,
        });
    }

    /// Copy of the current records, oldest-first
    pub async fn records(&self) -> Vec<FallbackRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
