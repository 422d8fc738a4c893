//! Compliance report aggregation
//!
//! Reports are a deterministic reduction over a point-in-time snapshot. The
//! store hands out copies, so aggregation never races an ongoing append.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{AuditEventType, ComplianceCategory, RiskLevel};
use crate::entry::AuditLogEntry;

/// Per-actor activity rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub actor_role: String,
    pub event_count: u64,
    /// Latest matching entry timestamp for this actor
    pub last_activity: DateTime<Utc>,
}

/// Aggregated view of one compliance category over a reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub category: ComplianceCategory,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub total_events: u64,
    /// Count per risk level; sums to `total_events`
    pub risk_breakdown: BTreeMap<RiskLevel, u64>,
    /// Count per event type; sums to `total_events`
    pub event_breakdown: BTreeMap<AuditEventType, u64>,
    /// Keyed by actor id
    pub user_activity: BTreeMap<String, UserActivity>,
    /// Matching entries, newest-first
    pub entries: Vec<AuditLogEntry>,
}

impl ComplianceReport {
    /// Reduce a snapshot into a report for one category and period.
    ///
    /// The period is inclusive on both ends.
    pub fn build(
        category: ComplianceCategory,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        snapshot: Vec<AuditLogEntry>,
    ) -> Self {
        let mut entries: Vec<_> = snapshot
            .into_iter()
            .filter(|e| {
                e.category == category && e.timestamp >= period_start && e.timestamp <= period_end
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut risk_breakdown: BTreeMap<RiskLevel, u64> = BTreeMap::new();
        let mut event_breakdown: BTreeMap<AuditEventType, u64> = BTreeMap::new();
        let mut user_activity: BTreeMap<String, UserActivity> = BTreeMap::new();

        for entry in &entries {
            *risk_breakdown.entry(entry.risk_level).or_insert(0) += 1;
            *event_breakdown.entry(entry.event_type).or_insert(0) += 1;

            user_activity
                .entry(entry.actor_id.clone())
                .and_modify(|activity| {
                    activity.event_count += 1;
                    if entry.timestamp > activity.last_activity {
                        activity.last_activity = entry.timestamp;
                    }
                })
                .or_insert_with(|| UserActivity {
                    actor_role: entry.actor_role.clone(),
                    event_count: 1,
                    last_activity: entry.timestamp,
                });
        }

        Self {
            category,
            period_start,
            period_end,
            generated_at: Utc::now(),
            total_events: entries.len() as u64,
            risk_breakdown,
            event_breakdown,
            user_activity,
            entries,
        }
    }
}
