// ============================================================================
// Member Audit Trail
// ============================================================================
//
// Append-only. One entry per member status or role transition; the metadata
// column carries the pre/post state as JSON (e.g. the role held before a
// removal, which reactivation restores).
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MemberRole, string_enum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Added,
    Removed,
    Reactivated,
    RoleChanged,
}

string_enum!(AuditAction, "audit action", {
    Added => "added",
    Removed => "removed",
    Reactivated => "reactivated",
    RoleChanged => "role_changed",
});

/// Persisted member audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAuditEntry {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub member_id: Uuid,
    pub action: AuditAction,
    pub performed_by: Uuid,
    pub reason: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Metadata key holding the role a member had before removal
pub const PREVIOUS_ROLE_KEY: &str = "previous_role";

impl MemberAuditEntry {
    pub fn new(
        organization_id: Option<Uuid>,
        member_id: Uuid,
        action: AuditAction,
        performed_by: Uuid,
        reason: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            member_id,
            action,
            performed_by,
            reason,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Role recorded under `previous_role`, if present and parseable
    pub fn previous_role(&self) -> Option<MemberRole> {
        self.metadata
            .get(PREVIOUS_ROLE_KEY)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_previous_role_from_metadata() {
        let entry = MemberAuditEntry::new(
            None,
            Uuid::new_v4(),
            AuditAction::Removed,
            Uuid::new_v4(),
            None,
            json!({ "previous_role": "admin" }),
        );
        assert_eq!(entry.previous_role(), Some(MemberRole::Admin));
    }

    #[test]
    fn test_previous_role_missing_or_garbage() {
        let missing = MemberAuditEntry::new(
            None,
            Uuid::new_v4(),
            AuditAction::Removed,
            Uuid::new_v4(),
            None,
            json!({}),
        );
        assert_eq!(missing.previous_role(), None);

        let garbage = MemberAuditEntry::new(
            None,
            Uuid::new_v4(),
            AuditAction::Removed,
            Uuid::new_v4(),
            None,
            json!({ "previous_role": 42 }),
        );
        assert_eq!(garbage.previous_role(), None);
    }
}
