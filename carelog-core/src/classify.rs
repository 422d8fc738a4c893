//! Event taxonomy and risk classification
//!
//! Classification is a static table, not a per-call heuristic: risk level and
//! compliance category are pure functions of the event type, so every entry
//! for a given event carries the same classification and the table can be
//! tested in isolation.

use serde::{Deserialize, Serialize};

/// Coarse severity classification driving escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Convert to storage string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse from storage string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Regulatory bucket used to scope filtered reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceCategory {
    AccessPrivacy,
    MedicationSafety,
    CareQuality,
    StaffManagement,
    EmergencyResponse,
    FamilyCommunication,
}

impl ComplianceCategory {
    pub const ALL: [ComplianceCategory; 6] = [
        Self::AccessPrivacy,
        Self::MedicationSafety,
        Self::CareQuality,
        Self::StaffManagement,
        Self::EmergencyResponse,
        Self::FamilyCommunication,
    ];

    /// Convert to storage string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessPrivacy => "access_privacy",
            Self::MedicationSafety => "medication_safety",
            Self::CareQuality => "care_quality",
            Self::StaffManagement => "staff_management",
            Self::EmergencyResponse => "emergency_response",
            Self::FamilyCommunication => "family_communication",
        }
    }

    /// Parse from storage string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access_privacy" => Some(Self::AccessPrivacy),
            "medication_safety" => Some(Self::MedicationSafety),
            "care_quality" => Some(Self::CareQuality),
            "staff_management" => Some(Self::StaffManagement),
            "emergency_response" => Some(Self::EmergencyResponse),
            "family_communication" => Some(Self::FamilyCommunication),
            _ => None,
        }
    }
}

/// Closed taxonomy of auditable actions in the administration app
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ResidentRecordViewed,
    ResidentRecordUpdated,
    ResidentAdmitted,
    ResidentDischarged,
    MedicationAdministered,
    MedicationMissed,
    MedicationScheduleChanged,
    CarePlanUpdated,
    VitalSignsRecorded,
    IncidentReported,
    NoteAdded,
    EmergencyAlert,
    EmergencyResolved,
    StaffLogin,
    StaffLogout,
    StaffRoleChanged,
    ShiftAssigned,
    FamilyMessageSent,
    FamilyVisitScheduled,
    BillingRecordViewed,
    BillingAdjusted,
    PermissionChanged,
    DataExport,
}

impl AuditEventType {
    /// Every variant, for totality checks and reporting sweeps
    pub const ALL: [AuditEventType; 23] = [
        Self::ResidentRecordViewed,
        Self::ResidentRecordUpdated,
        Self::ResidentAdmitted,
        Self::ResidentDischarged,
        Self::MedicationAdministered,
        Self::MedicationMissed,
        Self::MedicationScheduleChanged,
        Self::CarePlanUpdated,
        Self::VitalSignsRecorded,
        Self::IncidentReported,
        Self::NoteAdded,
        Self::EmergencyAlert,
        Self::EmergencyResolved,
        Self::StaffLogin,
        Self::StaffLogout,
        Self::StaffRoleChanged,
        Self::ShiftAssigned,
        Self::FamilyMessageSent,
        Self::FamilyVisitScheduled,
        Self::BillingRecordViewed,
        Self::BillingAdjusted,
        Self::PermissionChanged,
        Self::DataExport,
    ];

    /// Convert to storage string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResidentRecordViewed => "resident_record_viewed",
            Self::ResidentRecordUpdated => "resident_record_updated",
            Self::ResidentAdmitted => "resident_admitted",
            Self::ResidentDischarged => "resident_discharged",
            Self::MedicationAdministered => "medication_administered",
            Self::MedicationMissed => "medication_missed",
            Self::MedicationScheduleChanged => "medication_schedule_changed",
            Self::CarePlanUpdated => "care_plan_updated",
            Self::VitalSignsRecorded => "vital_signs_recorded",
            Self::IncidentReported => "incident_reported",
            Self::NoteAdded => "note_added",
            Self::EmergencyAlert => "emergency_alert",
            Self::EmergencyResolved => "emergency_resolved",
            Self::StaffLogin => "staff_login",
            Self::StaffLogout => "staff_logout",
            Self::StaffRoleChanged => "staff_role_changed",
            Self::ShiftAssigned => "shift_assigned",
            Self::FamilyMessageSent => "family_message_sent",
            Self::FamilyVisitScheduled => "family_visit_scheduled",
            Self::BillingRecordViewed => "billing_record_viewed",
            Self::BillingAdjusted => "billing_adjusted",
            Self::PermissionChanged => "permission_changed",
            Self::DataExport => "data_export",
        }
    }

    /// Parse from storage string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == s)
    }
}

/// Risk level and compliance category assigned to an event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub risk_level: RiskLevel,
    pub category: ComplianceCategory,
}

/// Classify an event type.
///
/// Total over the taxonomy: variants without an explicit mapping fall through
/// to low-risk care-quality, so logging can never fail on an event the table
/// has no opinion about.
pub fn classify(event_type: AuditEventType) -> Classification {
    use AuditEventType as E;
    use ComplianceCategory as C;
    use RiskLevel as R;

    let (risk_level, category) = match event_type {
        E::ResidentRecordViewed => (R::Medium, C::AccessPrivacy),
        E::ResidentRecordUpdated => (R::Medium, C::AccessPrivacy),
        E::ResidentAdmitted => (R::Medium, C::CareQuality),
        E::ResidentDischarged => (R::Medium, C::CareQuality),
        E::MedicationAdministered => (R::High, C::MedicationSafety),
        E::MedicationMissed => (R::High, C::MedicationSafety),
        E::MedicationScheduleChanged => (R::Medium, C::MedicationSafety),
        E::CarePlanUpdated => (R::Medium, C::CareQuality),
        E::IncidentReported => (R::High, C::CareQuality),
        E::EmergencyAlert => (R::Critical, C::EmergencyResponse),
        E::EmergencyResolved => (R::High, C::EmergencyResponse),
        E::StaffLogin | E::StaffLogout => (R::Low, C::StaffManagement),
        E::StaffRoleChanged => (R::High, C::StaffManagement),
        E::ShiftAssigned => (R::Low, C::StaffManagement),
        E::FamilyMessageSent | E::FamilyVisitScheduled => (R::Low, C::FamilyCommunication),
        E::BillingRecordViewed => (R::Medium, C::AccessPrivacy),
        E::BillingAdjusted => (R::High, C::AccessPrivacy),
        E::PermissionChanged => (R::Critical, C::AccessPrivacy),
        E::DataExport => (R::High, C::AccessPrivacy),
        // Everything else is routine care documentation
        _ => (R::Low, C::CareQuality),
    };

    Classification {
        risk_level,
        category,
    }
}
