// ============================================================================
// Organization Members
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::string_enum;

/// Lifecycle status of an organization member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Pending,
    Removed,
    Suspended,
}

string_enum!(MemberStatus, "member status", {
    Active => "active",
    Pending => "pending",
    Removed => "removed",
    Suspended => "suspended",
});

/// Organization-scoped role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
    /// Assigned on removal; the role held before is kept in the audit trail
    InactiveMember,
}

string_enum!(MemberRole, "member role", {
    Owner => "owner",
    Admin => "admin",
    Member => "member",
    InactiveMember => "inactive_member",
});

impl MemberRole {
    /// Owners and admins may remove, reactivate and re-role other members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }

    /// Roles that may be granted through reactivation or a role change
    pub fn is_assignable(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Member)
    }
}

/// Organization a member belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
}

/// Member record as persisted in `members`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub email: String,
    pub display_name: String,
    pub status: MemberStatus,
    pub role: MemberRole,
    pub removal_date: Option<DateTime<Utc>>,
    pub removal_reason: Option<String>,
    pub removed_by: Option<Uuid>,
    pub reactivated_by: Option<Uuid>,
    pub reactivated_at: Option<DateTime<Utc>>,
    pub reactivation_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    pub fn belongs_to(&self, organization_id: Uuid) -> bool {
        self.organization_id == Some(organization_id)
    }
}

/// Status mutation applied by the lifecycle coordinator.
///
/// Each variant is one transition; the store applies exactly the columns the
/// variant names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberStatusPatch {
    Removed {
        removed_by: Uuid,
        removal_date: DateTime<Utc>,
        reason: Option<String>,
    },
    Reactivated {
        role: MemberRole,
        reactivated_by: Uuid,
        reactivated_at: DateTime<Utc>,
    },
    RoleChanged {
        role: MemberRole,
    },
}

/// Member counts for one organization, grouped by status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatistics {
    pub organization_id: Uuid,
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub removed: i64,
    pub suspended: i64,
}

impl MemberStatistics {
    pub fn from_counts(organization_id: Uuid, counts: &[(MemberStatus, i64)]) -> Self {
        let mut stats = MemberStatistics {
            organization_id,
            ..Default::default()
        };
        for (status, count) in counts {
            match status {
                MemberStatus::Active => stats.active += count,
                MemberStatus::Pending => stats.pending += count,
                MemberStatus::Removed => stats.removed += count,
                MemberStatus::Suspended => stats.suspended += count,
            }
            stats.total += count;
        }
        stats
    }
}
