// ============================================================================
// Conversations and the Ownership Log
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::string_enum;

/// Buyer-seller thread scoped to one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub listing_id: Uuid,
    /// Seller-role participant; follows the listing's current owner
    pub seller_id: Uuid,
    pub buyer_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Why the seller participant of a conversation changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipChangeReason {
    /// Listing moved to an explicit transfer target during member removal
    MemberRemovedTransfer,
    /// Listing fell back to a company handler during member removal
    MemberRemovedFallback,
    MemberReactivated,
    ListingTransferred,
}

string_enum!(OwnershipChangeReason, "ownership change reason", {
    MemberRemovedTransfer => "member_removed_transfer",
    MemberRemovedFallback => "member_removed_fallback",
    MemberReactivated => "member_reactivated",
    ListingTransferred => "listing_transferred",
});

/// Append-only record of a seller participant change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipLogEntry {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub old_owner_id: Option<Uuid>,
    pub new_owner_id: Uuid,
    pub reason: OwnershipChangeReason,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl OwnershipLogEntry {
    pub fn new(
        conversation_id: Uuid,
        old_owner_id: Option<Uuid>,
        new_owner_id: Uuid,
        reason: OwnershipChangeReason,
        changed_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            old_owner_id,
            new_owner_id,
            reason,
            changed_by,
            created_at: Utc::now(),
        }
    }
}
