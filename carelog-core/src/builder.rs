//! Audit entry construction

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::classify::{AuditEventType, classify};
use crate::entry::{ActorContext, AuditLogEntry, EntryDetails};
use crate::integrity;

/// Builds immutable audit entries.
///
/// Pure apart from id and timestamp generation. Ids are UUIDv7 (millisecond
/// time prefix plus random suffix), so collisions are negligible at any write
/// rate this client will see. The clock is injectable for deterministic
/// timestamps in tests.
pub struct EntryBuilder {
    clock: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self {
            clock: Box::new(Utc::now),
        }
    }

    /// Use a fixed or simulated clock
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Assemble an entry: generate id, stamp UTC time, classify, digest
    pub fn build(
        &self,
        event_type: AuditEventType,
        details: EntryDetails,
        actor: &ActorContext,
    ) -> AuditLogEntry {
        let timestamp = (self.clock)();
        let classification = classify(event_type);
        let checksum = integrity::checksum(timestamp, event_type, &actor.actor_id, &details);

        AuditLogEntry {
            id: Uuid::now_v7().to_string(),
            timestamp,
            event_type,
            actor_id: actor.actor_id.clone(),
            actor_role: actor.actor_role.clone(),
            session_id: actor.session_id.clone(),
            risk_level: classification.risk_level,
            category: classification.category,
            details,
            checksum,
        }
    }
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ComplianceCategory, RiskLevel};
    use crate::entry::DetailValue;

    fn test_actor() -> ActorContext {
        ActorContext::new("nurse-7", "nurse", "sess-1")
    }

    fn medication_details() -> EntryDetails {
        EntryDetails::from_pairs([
            ("resident_id", DetailValue::from("r1")),
            ("medication_id", DetailValue::from("m1")),
        ])
        .unwrap()
    }

    #[test]
    fn build_classifies_and_stamps() {
        let builder = EntryBuilder::new();
        let entry = builder.build(
            AuditEventType::MedicationAdministered,
            medication_details(),
            &test_actor(),
        );

        assert_eq!(entry.risk_level, RiskLevel::High);
        assert_eq!(entry.category, ComplianceCategory::MedicationSafety);
        assert_eq!(entry.actor_id, "nurse-7");
        assert_eq!(entry.actor_role, "nurse");
        assert_eq!(entry.session_id, "sess-1");
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn built_entries_verify_immediately() {
        let builder = EntryBuilder::new();
        let entry = builder.build(
            AuditEventType::EmergencyAlert,
            EntryDetails::new(),
            &test_actor(),
        );
        assert!(integrity::verify(&entry));
    }

    #[test]
    fn tampered_entry_fails_verification() {
        let builder = EntryBuilder::new();
        let mut entry = builder.build(
            AuditEventType::MedicationAdministered,
            medication_details(),
            &test_actor(),
        );

        entry.details.insert("medication_id", "m9").unwrap();
        assert!(!integrity::verify(&entry));
    }

    #[test]
    fn ids_are_unique() {
        let builder = EntryBuilder::new();
        let actor = test_actor();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..100 {
            let entry = builder.build(AuditEventType::NoteAdded, EntryDetails::new(), &actor);
            assert!(ids.insert(entry.id));
        }
    }

    #[test]
    fn injected_clock_controls_timestamp() {
        let fixed: DateTime<Utc> = "2026-01-15T08:30:00Z".parse().unwrap();
        let builder = EntryBuilder::with_clock(move || fixed);
        let entry = builder.build(AuditEventType::StaffLogin, EntryDetails::new(), &test_actor());

        assert_eq!(entry.timestamp, fixed);
        assert!(integrity::verify(&entry));
    }
}
