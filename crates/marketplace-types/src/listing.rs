// ============================================================================
// Listings and Ownership
// ============================================================================
//
// A listing keeps two owner references:
// - original_owner_id: the creator, never changes
// - current_owner_id:  whoever currently answers buyer messages
//
// Listings are never deleted by the routing core, only status-flagged.
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::string_enum;

/// Kind of principal referenced by `current_owner_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    /// A regular member answering for their own (or a transferred) listing
    Member,
    /// A company handler absorbing messages for an inactive member
    OrgHandler,
}

string_enum!(OwnerType, "owner type", {
    Member => "member",
    OrgHandler => "org_handler",
});

/// Listing publication status.
///
/// Only `Active` and `SuspendedMemberRemoved` are written by this service;
/// the other values are owned by the listing CRUD service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    SuspendedMemberRemoved,
    Transferred,
    Sold,
    Expired,
}

string_enum!(ListingStatus, "listing status", {
    Active => "active",
    SuspendedMemberRemoved => "suspended_member_removed",
    Transferred => "transferred",
    Sold => "sold",
    Expired => "expired",
});

/// Listing ownership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub title: String,
    pub original_owner_id: Uuid,
    pub current_owner_id: Uuid,
    pub current_owner_type: OwnerType,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    pub fn is_owned_by_original_seller(&self) -> bool {
        self.current_owner_id == self.original_owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_status_strings() {
        assert_eq!(
            ListingStatus::SuspendedMemberRemoved.as_str(),
            "suspended_member_removed"
        );
        assert_eq!(
            "suspended_member_removed".parse::<ListingStatus>().unwrap(),
            ListingStatus::SuspendedMemberRemoved
        );
        assert_eq!("org_handler".parse::<OwnerType>().unwrap(), OwnerType::OrgHandler);
    }

    #[test]
    fn test_unknown_status_reports_kind() {
        let err = "archived".parse::<ListingStatus>().unwrap_err();
        assert_eq!(err.kind, "listing status");
        assert_eq!(err.value, "archived");
    }
}
