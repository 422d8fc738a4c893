//! Tamper-evidence digests for audit entries
//!
//! The digest covers a canonical, fixed-order encoding of the protected
//! fields: timestamp, event type, actor id, then the details payload in
//! sorted-key order. Every component is length-prefixed before hashing so
//! adjacent fields cannot be confused by concatenation. SHA-256, hex output.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::classify::AuditEventType;
use crate::entry::{AuditLogEntry, EntryDetails};

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Compute the digest over the protected fields
pub fn checksum(
    timestamp: DateTime<Utc>,
    event_type: AuditEventType,
    actor_id: &str,
    details: &EntryDetails,
) -> String {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, timestamp.to_rfc3339().as_bytes());
    update_field(&mut hasher, event_type.as_str().as_bytes());
    update_field(&mut hasher, actor_id.as_bytes());

    // BTreeMap iteration gives sorted-key order on every runtime
    for (key, value) in details.iter() {
        update_field(&mut hasher, key.as_bytes());
        update_field(&mut hasher, value.canonical_str().as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Recompute an entry's digest and compare against the stored checksum
pub fn verify(entry: &AuditLogEntry) -> bool {
    entry.checksum
        == checksum(
            entry.timestamp,
            entry.event_type,
            &entry.actor_id,
            &entry.details,
        )
}
