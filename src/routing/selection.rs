// ============================================================================
// Fallback Recipient Selection
// ============================================================================
//
// Pure selection over already-loaded rows; no I/O.
//
// Tiers, first non-empty tier wins:
// 1. Designated handler: registration is_active and can_handle_transferred,
//    and the member is currently an active member of the organization.
//    Ordered by (registered created_at, member_id).
// 2. Admin fallback: any active member with role admin or owner.
//    Ordered by (joined created_at, member_id).
//
// ============================================================================

use marketplace_types::{CompanyMessageHandler, Member, MemberRole};
use serde::Serialize;
use uuid::Uuid;

/// Which tier produced a fallback recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    DesignatedHandler,
    AdminFallback,
}

impl FallbackTier {
    /// Metric label for the resolution path
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackTier::DesignatedHandler => "designated_handler",
            FallbackTier::AdminFallback => "admin_fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackCandidate {
    pub member_id: Uuid,
    pub tier: FallbackTier,
}

/// Pick the company fallback recipient.
///
/// `active_members` must be the organization's active members; `exclude`
/// removes one member from both tiers (the member currently being removed).
pub fn select_fallback(
    handlers: &[CompanyMessageHandler],
    active_members: &[Member],
    exclude: Option<Uuid>,
) -> Option<FallbackCandidate> {
    let eligible = |member_id: Uuid| {
        Some(member_id) != exclude && active_members.iter().any(|m| m.id == member_id && m.is_active())
    };

    let designated = handlers
        .iter()
        .filter(|h| h.is_active && h.can_handle_transferred && eligible(h.member_id))
        .min_by_key(|h| (h.created_at, h.member_id));

    if let Some(handler) = designated {
        return Some(FallbackCandidate {
            member_id: handler.member_id,
            tier: FallbackTier::DesignatedHandler,
        });
    }

    active_members
        .iter()
        .filter(|m| matches!(m.role, MemberRole::Admin | MemberRole::Owner))
        .filter(|m| eligible(m.id))
        .min_by_key(|m| (m.created_at, m.id))
        .map(|m| FallbackCandidate {
            member_id: m.id,
            tier: FallbackTier::AdminFallback,
        })
}
