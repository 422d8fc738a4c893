//! Core audit record types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{AuditEventType, ComplianceCategory, RiskLevel};
use crate::error::AuditError;

/// Maximum number of keys in a details payload
pub const MAX_DETAIL_KEYS: usize = 32;
/// Maximum length of a details key, in bytes
pub const MAX_KEY_LEN: usize = 64;
/// Maximum length of a string value in a details payload, in bytes
pub const MAX_STRING_LEN: usize = 512;

/// A single value in a details payload.
///
/// Closed set of value types; no unconstrained dynamic typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl DetailValue {
    /// Fixed textual rendering used by the canonical digest encoding
    pub(crate) fn canonical_str(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Str(s) => s.clone(),
        }
    }
}

impl From<bool> for DetailValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for DetailValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Bounded key/value payload attached to an audit entry.
///
/// Backed by a `BTreeMap` so iteration order is stable, which the integrity
/// digest depends on. Size caps are enforced at insertion; violations are
/// serialization errors, which the service recovers through the fallback
/// path rather than failing the caller's action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryDetails {
    values: BTreeMap<String, DetailValue>,
}

impl EntryDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, enforcing the payload bounds
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DetailValue>,
    ) -> Result<(), AuditError> {
        let key = key.into();
        if key.len() > MAX_KEY_LEN {
            return Err(AuditError::Serialization(format!(
                "details key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        let value = value.into();
        if let DetailValue::Str(s) = &value {
            if s.len() > MAX_STRING_LEN {
                return Err(AuditError::Serialization(format!(
                    "details value for '{key}' exceeds {MAX_STRING_LEN} bytes"
                )));
            }
        }
        if !self.values.contains_key(&key) && self.values.len() >= MAX_DETAIL_KEYS {
            return Err(AuditError::Serialization(format!(
                "details payload exceeds {MAX_DETAIL_KEYS} keys"
            )));
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Build a payload from key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, AuditError>
    where
        K: Into<String>,
        V: Into<DetailValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut details = Self::new();
        for (key, value) in pairs {
            details.insert(key, value)?;
        }
        Ok(details)
    }

    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.values.get(key)
    }

    /// Iterate in stable (sorted-key) order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DetailValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Identity context supplied by the session provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: String,
    pub actor_role: String,
    pub session_id: String,
}

impl ActorContext {
    pub fn new(
        actor_id: impl Into<String>,
        actor_role: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_role: actor_role.into(),
            session_id: session_id.into(),
        }
    }
}

/// Device context supplied by the platform provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    pub os_version: String,
    pub app_version: String,
}

impl DeviceInfo {
    /// Fold device context into a details payload under reserved keys, so
    /// the persisted record layout stays fixed and the checksum covers it
    pub fn apply_to(&self, details: &mut EntryDetails) -> Result<(), AuditError> {
        details.insert("device.platform", self.platform.as_str())?;
        details.insert("device.os_version", self.os_version.as_str())?;
        details.insert("device.app_version", self.app_version.as_str())?;
        Ok(())
    }
}

/// Immutable record of a sensitive action.
///
/// Created once by the builder, persisted once, never mutated in place. The
/// checksum is a SHA-256 digest over a canonical encoding of the protected
/// fields; any post-creation change to those fields is detectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Process-unique opaque identifier (UUIDv7)
    pub id: String,
    /// UTC instant, serialized as ISO-8601
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub actor_id: String,
    pub actor_role: String,
    pub session_id: String,
    pub risk_level: RiskLevel,
    pub category: ComplianceCategory,
    pub details: EntryDetails,
    /// Hex SHA-256 over `{timestamp, event_type, actor_id, details}`
    pub checksum: String,
}
