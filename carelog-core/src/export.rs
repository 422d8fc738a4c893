//! Audit log export payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::{AuditLogEntry, EntryDetails};
use crate::error::AuditError;
use crate::store::AuditQuery;

/// Serialized snapshot of a filtered entry set.
///
/// The payload is taken before the export itself is audited, so the
/// `data_export` entry describing this export is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPayload {
    pub export_id: String,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub entry_count: usize,
    pub entries: Vec<AuditLogEntry>,
}

impl ExportPayload {
    pub fn new(exported_by: impl Into<String>, entries: Vec<AuditLogEntry>) -> Self {
        Self {
            export_id: Uuid::now_v7().to_string(),
            exported_at: Utc::now(),
            exported_by: exported_by.into(),
            entry_count: entries.len(),
            entries,
        }
    }

    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Details payload for the audit entry recording an export: who asked for
/// what, and how many entries the snapshot contained
pub fn export_details(query: &AuditQuery, entry_count: usize) -> Result<EntryDetails, AuditError> {
    let mut details = EntryDetails::new();
    details.insert("entry_count", entry_count as i64)?;
    if let Some(event_type) = query.event_type {
        details.insert("filter.event_type", event_type.as_str())?;
    }
    if let Some(actor_id) = &query.actor_id {
        details.insert("filter.actor_id", actor_id.as_str())?;
    }
    if let Some(risk_level) = query.risk_level {
        details.insert("filter.risk_level", risk_level.as_str())?;
    }
    if let Some(category) = query.category {
        details.insert("filter.category", category.as_str())?;
    }
    if let Some(start) = query.start {
        details.insert("filter.start", start.to_rfc3339())?;
    }
    if let Some(end) = query.end {
        details.insert("filter.end", end.to_rfc3339())?;
    }
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EntryBuilder;
    use crate::classify::{AuditEventType, RiskLevel};
    use crate::entry::{ActorContext, DetailValue};

    fn sample_entries(n: usize) -> Vec<AuditLogEntry> {
        let builder = EntryBuilder::new();
        let actor = ActorContext::new("admin-1", "admin", "sess-1");
        (0..n)
            .map(|_| builder.build(AuditEventType::ResidentRecordViewed, EntryDetails::new(), &actor))
            .collect()
    }

    #[test]
    fn payload_counts_entries() {
        let payload = ExportPayload::new("admin-1", sample_entries(3));
        assert_eq!(payload.entry_count, 3);
        assert_eq!(payload.entries.len(), 3);
        assert_eq!(payload.exported_by, "admin-1");
    }

    #[test]
    fn payload_json_roundtrip() {
        let payload = ExportPayload::new("admin-1", sample_entries(2));
        let json = payload.to_json().unwrap();

        let parsed: ExportPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entry_count, 2);
        assert_eq!(parsed.export_id, payload.export_id);
    }

    #[test]
    fn export_details_summarize_the_filter() {
        let query = AuditQuery::new()
            .with_actor("nurse-7")
            .with_risk_level(RiskLevel::High);
        let details = export_details(&query, 12).unwrap();

        assert_eq!(details.get("entry_count"), Some(&DetailValue::Int(12)));
        assert_eq!(details.get("filter.actor_id"), Some(&DetailValue::Str("nurse-7".into())));
        assert_eq!(details.get("filter.risk_level"), Some(&DetailValue::Str("high".into())));
        assert_eq!(details.get("filter.event_type"), None);
    }
}
