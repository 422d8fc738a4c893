//! Retention-window purging
//!
//! Healthcare compliance requires long-horizon retention; the default window
//! is about seven years. Purging is a pure function over a snapshot so it can
//! run concurrently with ongoing appends and is trivially idempotent.

use chrono::{DateTime, Duration, Utc};

use crate::entry::AuditLogEntry;

/// Default retention window, roughly seven years
pub const DEFAULT_RETENTION_DAYS: i64 = 2555;

/// Split entries into survivors and a purged count.
///
/// An entry is purge-eligible only once `now - timestamp` strictly exceeds
/// the retention window; an entry exactly at the boundary is retained.
pub fn purge(
    entries: Vec<AuditLogEntry>,
    now: DateTime<Utc>,
    retention_days: i64,
) -> (Vec<AuditLogEntry>, usize) {
    let window = Duration::days(retention_days);
    let before = entries.len();
    let survivors: Vec<_> = entries
        .into_iter()
        .filter(|entry| now - entry.timestamp <= window)
        .collect();
    let purged = before - survivors.len();
    (survivors, purged)
}
