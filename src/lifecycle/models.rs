use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marketplace_types::{ListingStatus, MemberRole, OwnerType, OwnershipLogEntry};

use crate::routing::PropagationFailure;

fn default_true() -> bool {
    true
}

/// Options for removing a member
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOptions {
    /// Active member of the same organization who takes over the listings
    #[serde(default)]
    pub transfer_to: Option<Uuid>,
    /// Without a transfer target: suspend listings (true) or hand them to the
    /// company fallback handler (false)
    #[serde(default = "default_true")]
    pub suspend_listings: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            transfer_to: None,
            suspend_listings: true,
            reason: None,
        }
    }
}

/// Options for reactivating a removed member
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactivationOptions {
    /// Overrides the role held before removal; member or admin only
    #[serde(default)]
    pub new_role: Option<MemberRole>,
    #[serde(default = "default_true")]
    pub restore_listings: bool,
}

impl Default for ReactivationOptions {
    fn default() -> Self {
        Self {
            new_role: None,
            restore_listings: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingActionKind {
    /// Status set to suspended_member_removed, owner pointer unchanged
    Suspended,
    /// Owner pointer moved to the explicit transfer target
    Transferred,
    /// Owner pointer moved to the company fallback handler
    HandedToCompany,
}

/// What the removal did to one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAction {
    pub listing_id: Uuid,
    pub action: ListingActionKind,
    pub previous_owner_id: Uuid,
    pub current_owner_id: Uuid,
    pub current_owner_type: OwnerType,
    pub status: ListingStatus,
}

/// Result of a best-effort notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalResult {
    pub member_id: Uuid,
    pub listing_actions: Vec<ListingAction>,
    /// Ownership log entries written while propagating to conversations
    pub conversation_updates: Vec<OwnershipLogEntry>,
    /// Conversations left for the live fallback; empty when propagation
    /// fully succeeded
    pub propagation_failures: Vec<PropagationFailure>,
    pub notification: NotificationOutcome,
    pub can_reactivate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactivationResult {
    pub member_id: Uuid,
    pub role: MemberRole,
    pub restored_listings: Vec<Uuid>,
    pub conversation_updates: Vec<OwnershipLogEntry>,
    pub propagation_failures: Vec<PropagationFailure>,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeResult {
    pub member_id: Uuid,
    pub previous_role: MemberRole,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingTransferResult {
    pub listing_id: Uuid,
    pub previous_owner_id: Uuid,
    pub new_owner_id: Uuid,
    pub conversation_updates: Vec<OwnershipLogEntry>,
    pub propagation_failures: Vec<PropagationFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_options_defaults_to_suspend() {
        let options: RemovalOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, RemovalOptions::default());
        assert!(options.suspend_listings);

        let options: RemovalOptions =
            serde_json::from_str(r#"{"suspendListings": false, "reason": "left"}"#).unwrap();
        assert!(!options.suspend_listings);
        assert_eq!(options.reason.as_deref(), Some("left"));
    }

    #[test]
    fn test_reactivation_options_parse_role() {
        let options: ReactivationOptions =
            serde_json::from_str(r#"{"newRole": "admin", "restoreListings": false}"#).unwrap();
        assert_eq!(options.new_role, Some(MemberRole::Admin));
        assert!(!options.restore_listings);
    }

    #[test]
    fn test_notification_outcome_shape() {
        let json = serde_json::to_value(NotificationOutcome::Failed {
            error: "timeout".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "timeout");
    }
}
