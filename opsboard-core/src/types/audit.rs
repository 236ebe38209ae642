//! Audit-trail types.
//!
//! Every mutating operation records who did what to which resource. The
//! split between [`AuditEvent`] (not yet persisted) and [`AuditEntry`]
//! (persisted, with id and timestamp) keeps sink implementations in charge
//! of id assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An audit event prior to persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    /// What happened (e.g. "create_user").
    pub action: String,
    /// Kind of resource affected (e.g. "user").
    pub resource_type: String,
    /// Provider-scoped resource identifier.
    pub resource_id: String,
    /// Who performed the action.
    pub actor: String,
    /// Free-form detail line.
    pub details: String,
}

impl AuditEvent {
    /// Creates an event.
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        actor: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            actor: actor.into(),
            details: details.into(),
        }
    }
}

/// A persisted audit entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Sequential entry ID (assigned by the sink).
    pub id: u64,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: String,
    /// Kind of resource affected.
    pub resource_type: String,
    /// Provider-scoped resource identifier.
    pub resource_id: String,
    /// Who performed the action.
    pub actor: String,
    /// Free-form detail line.
    pub details: String,
}

impl AuditEntry {
    /// Materializes an event into an entry with the given id, stamped now.
    pub fn from_event(id: u64, event: AuditEvent) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            action: event.action,
            resource_type: event.resource_type,
            resource_id: event.resource_id,
            actor: event.actor,
            details: event.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_event() {
        let event = AuditEvent::new("disable_user", "user", "u-1", "system", "Disabled user u-1");
        let entry = AuditEntry::from_event(7, event);

        assert_eq!(entry.id, 7);
        assert_eq!(entry.action, "disable_user");
        assert_eq!(entry.resource_id, "u-1");
    }

    #[test]
    fn test_entry_serializes_round_trip() {
        let entry = AuditEntry::from_event(
            1,
            AuditEvent::new("delete_user", "user", "u-2", "system", "Deleted user u-2"),
        );

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, entry.id);
        assert_eq!(back.action, entry.action);
        assert_eq!(back.timestamp, entry.timestamp);
    }
}
