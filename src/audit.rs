// ============================================================================
// Audit Logging - Ownership and Lifecycle Events
// ============================================================================
//
// Mirrors every persisted audit row onto the `audit` tracing target:
// - Member removals, reactivations and role changes (member_audit rows)
// - Conversation seller changes (conversation_ownership_log rows)
// - Explicit listing transfers
// - Company message handler registry changes
//
// The database rows remain the system of record; these events exist so log
// aggregation can follow ownership changes without querying the store.
//
// ============================================================================

use chrono::Utc;
use marketplace_types::{MemberAuditEntry, OwnershipLogEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    MemberAdded,
    MemberRemoved,
    MemberReactivated,
    MemberRoleChanged,
    /// Seller participant of a conversation changed
    ConversationOwnerChanged,
    ListingTransferred,
    HandlerRegistered,
    HandlerUpdated,
    HandlerRemoved,
}

/// Audit event for an ownership or lifecycle change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event timestamp (ISO8601)
    pub timestamp: String,

    pub event_type: AuditEventType,

    /// Who performed the change (None for system-initiated changes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,

    /// Member, conversation or listing the change applies to
    pub subject_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,

    /// Additional structured context
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        actor_id: Option<Uuid>,
        subject_id: Uuid,
        organization_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event_type,
            actor_id,
            subject_id,
            organization_id,
            details,
        }
    }

    /// Serializes audit event to JSON for logging
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Audit logger for ownership and lifecycle changes
pub struct AuditLogger;

impl AuditLogger {
    /// Logs a persisted member audit row
    pub fn log_member_audit(entry: &MemberAuditEntry) {
        use marketplace_types::AuditAction;

        let event_type = match entry.action {
            AuditAction::Added => AuditEventType::MemberAdded,
            AuditAction::Removed => AuditEventType::MemberRemoved,
            AuditAction::Reactivated => AuditEventType::MemberReactivated,
            AuditAction::RoleChanged => AuditEventType::MemberRoleChanged,
        };

        let event = AuditEvent::new(
            event_type,
            Some(entry.performed_by),
            entry.member_id,
            entry.organization_id,
            serde_json::json!({
                "audit_id": entry.id,
                "reason": entry.reason,
                "metadata": entry.metadata,
            }),
        );

        Self::log_event(&event);
    }

    /// Logs a persisted conversation ownership log row
    pub fn log_ownership_change(entry: &OwnershipLogEntry) {
        let event = AuditEvent::new(
            AuditEventType::ConversationOwnerChanged,
            entry.changed_by,
            entry.conversation_id,
            None,
            serde_json::json!({
                "old_owner_id": entry.old_owner_id,
                "new_owner_id": entry.new_owner_id,
                "reason": entry.reason.as_str(),
            }),
        );

        Self::log_event(&event);
    }

    /// Logs an explicit listing transfer
    pub fn log_listing_transfer(
        actor_id: Uuid,
        listing_id: Uuid,
        organization_id: Option<Uuid>,
        old_owner_id: Uuid,
        new_owner_id: Uuid,
    ) {
        let event = AuditEvent::new(
            AuditEventType::ListingTransferred,
            Some(actor_id),
            listing_id,
            organization_id,
            serde_json::json!({
                "old_owner_id": old_owner_id,
                "new_owner_id": new_owner_id,
            }),
        );

        Self::log_event(&event);
    }

    /// Logs a company message handler registry change
    pub fn log_handler_change(
        event_type: AuditEventType,
        actor_id: Uuid,
        organization_id: Uuid,
        member_id: Uuid,
        details: serde_json::Value,
    ) {
        let event = AuditEvent::new(
            event_type,
            Some(actor_id),
            member_id,
            Some(organization_id),
            details,
        );

        Self::log_event(&event);
    }

    fn log_event(event: &AuditEvent) {
        let json = event.to_json();

        tracing::info!(
            target: "audit",
            event_type = ?event.event_type,
            actor_id = ?event.actor_id,
            subject_id = %event.subject_id,
            organization_id = ?event.organization_id,
            timestamp = %event.timestamp,
            json = %json,
            "AUDIT: Ownership event logged"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_types::{AuditAction, OwnershipChangeReason};

    #[test]
    fn test_audit_event_serialization() {
        let member_id = Uuid::new_v4();
        let event = AuditEvent::new(
            AuditEventType::MemberRemoved,
            Some(Uuid::nil()),
            member_id,
            None,
            serde_json::json!({ "previous_role": "admin" }),
        );

        let json = event.to_json();
        assert!(json.contains("MEMBER_REMOVED"));
        assert!(json.contains(&member_id.to_string()));
        assert!(json.contains("previous_role"));
        assert!(!json.contains("organization_id"));
    }

    #[test]
    fn test_audit_event_without_details() {
        let event = AuditEvent::new(
            AuditEventType::HandlerRemoved,
            None,
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            serde_json::Value::Null,
        );

        let json = event.to_json();
        assert!(json.contains("HANDLER_REMOVED"));
        assert!(!json.contains("details"));
        assert!(!json.contains("actor_id"));
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        let entry = MemberAuditEntry::new(
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            AuditAction::Reactivated,
            Uuid::new_v4(),
            None,
            serde_json::json!({}),
        );
        AuditLogger::log_member_audit(&entry);

        let change = OwnershipLogEntry::new(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            OwnershipChangeReason::MemberRemovedFallback,
            None,
        );
        AuditLogger::log_ownership_change(&change);
    }
}
