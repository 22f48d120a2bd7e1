// ============================================================================
// Storage Interfaces
// ============================================================================
//
// All cross-request state lives in the store; nothing is cached in memory
// between requests. Every read and write happens inside a StoreTransaction:
//
//   let mut tx = store.begin().await?;
//   let member = tx.lock_member(id).await?;
//   ...
//   tx.commit().await?;
//
// Dropping a transaction without committing rolls it back in full.
//
// Implementations:
// - PostgresStore: production, row locks via SELECT ... FOR UPDATE
// - InMemoryStore: same semantics in process, used by tests and
//   STORAGE_BACKEND=memory
//
// ============================================================================

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use marketplace_error::AppResult;
use marketplace_types::{
    AuditAction, CompanyMessageHandler, Conversation, Listing, ListingStatus, Member,
    MemberAuditEntry, MemberStatus, MemberStatusPatch, Organization, OwnerType, OwnershipLogEntry,
};
use uuid::Uuid;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Entry point to the relational store
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    /// Open a transaction. Reads inside it see a consistent snapshot.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;

    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> AppResult<()>;
}

/// A unit of work spanning every store
#[async_trait]
pub trait StoreTransaction:
    MemberLifecycleStore + ListingOwnershipStore + ConversationOwnershipLog + CompanyMessageHandlerRegistry
{
    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Member status/role rows and the member audit trail
#[async_trait]
pub trait MemberLifecycleStore: Send {
    async fn get_member(&mut self, member_id: Uuid) -> AppResult<Option<Member>>;

    /// Load a member and hold its row lock until the transaction ends.
    /// Concurrent removal/reactivation of the same member serialize here.
    async fn lock_member(&mut self, member_id: Uuid) -> AppResult<Option<Member>>;

    /// Active members of an organization, ordered by (created_at, id)
    async fn get_active_members(&mut self, organization_id: Uuid) -> AppResult<Vec<Member>>;

    async fn update_member_status(
        &mut self,
        member_id: Uuid,
        patch: &MemberStatusPatch,
    ) -> AppResult<()>;

    async fn count_members_by_status(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Vec<(MemberStatus, i64)>>;

    async fn get_organization(&mut self, organization_id: Uuid)
    -> AppResult<Option<Organization>>;

    async fn append_member_audit(&mut self, entry: &MemberAuditEntry) -> AppResult<()>;

    /// Most recent audit entry of the given action for a member
    async fn latest_member_audit(
        &mut self,
        member_id: Uuid,
        action: AuditAction,
    ) -> AppResult<Option<MemberAuditEntry>>;

    /// Full audit history of a member, oldest first
    async fn member_audit_history(&mut self, member_id: Uuid) -> AppResult<Vec<MemberAuditEntry>>;
}

/// Current-owner pointer per listing
#[async_trait]
pub trait ListingOwnershipStore: Send {
    async fn get_listing(&mut self, listing_id: Uuid) -> AppResult<Option<Listing>>;

    /// Load a listing and hold its row lock until the transaction ends
    async fn lock_listing(&mut self, listing_id: Uuid) -> AppResult<Option<Listing>>;

    /// Active listings whose current owner is the member, ordered by
    /// (created_at, id)
    async fn get_active_listings_by_owner(&mut self, member_id: Uuid) -> AppResult<Vec<Listing>>;

    /// Listings a reactivated member takes back: suspended listings they
    /// still own as a member, and active or suspended listings they created
    /// that an org handler holds
    async fn get_restorable_listings(&mut self, member_id: Uuid) -> AppResult<Vec<Listing>>;

    async fn set_listing_owner(
        &mut self,
        listing_id: Uuid,
        owner_id: Uuid,
        owner_type: OwnerType,
    ) -> AppResult<()>;

    async fn set_listing_status(&mut self, listing_id: Uuid, status: ListingStatus)
    -> AppResult<()>;
}

/// Conversations, their seller participant, and the append-only ownership log
#[async_trait]
pub trait ConversationOwnershipLog: Send {
    /// Conversations bound to a listing, ordered by (created_at, id)
    async fn conversations_for_listing(&mut self, listing_id: Uuid)
    -> AppResult<Vec<Conversation>>;

    async fn get_conversation(&mut self, conversation_id: Uuid) -> AppResult<Option<Conversation>>;

    /// Load a conversation and hold its seller participant row lock
    async fn lock_conversation(&mut self, conversation_id: Uuid)
    -> AppResult<Option<Conversation>>;

    async fn set_seller_participant(
        &mut self,
        conversation_id: Uuid,
        seller_id: Uuid,
    ) -> AppResult<()>;

    async fn append_ownership_entry(&mut self, entry: &OwnershipLogEntry) -> AppResult<()>;

    /// Ownership history of a conversation, oldest first
    async fn ownership_history(&mut self, conversation_id: Uuid)
    -> AppResult<Vec<OwnershipLogEntry>>;
}

/// Company message handler designations.
///
/// Registrations evolve independently of member status; whether a handler is
/// still usable is decided at resolution time.
#[async_trait]
pub trait CompanyMessageHandlerRegistry: Send {
    /// Handlers of an organization ordered by (created_at, member_id)
    async fn list_handlers(&mut self, organization_id: Uuid)
    -> AppResult<Vec<CompanyMessageHandler>>;

    async fn get_handler(
        &mut self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<CompanyMessageHandler>>;

    /// Insert, or reactivate and update flags of, an existing designation.
    /// An existing registration keeps its original created_at.
    async fn upsert_handler(
        &mut self,
        handler: &CompanyMessageHandler,
    ) -> AppResult<CompanyMessageHandler>;

    async fn update_handler_flags(
        &mut self,
        organization_id: Uuid,
        member_id: Uuid,
        is_active: Option<bool>,
        can_handle_transferred: Option<bool>,
    ) -> AppResult<Option<CompanyMessageHandler>>;

    /// Returns whether a registration was deleted
    async fn delete_handler(&mut self, organization_id: Uuid, member_id: Uuid) -> AppResult<bool>;
}
