// ============================================================================
// In-Memory Store
// ============================================================================
//
// Same transactional contract as PostgresStore, held in process:
// - begin() takes a single async mutex, so transactions are serialized
//   (strictly stronger than per-row locks)
// - the transaction works on a copy of the state which replaces the shared
//   state on commit; dropping it discards every change
//
// Fault injection (FaultPlan) lets tests make individual writes fail the way a
// storage outage would.
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use marketplace_error::{AppError, AppResult};
use marketplace_types::{
    AuditAction, CompanyMessageHandler, Conversation, Listing, ListingStatus, Member,
    MemberAuditEntry, MemberStatus, MemberStatusPatch, Organization, OwnerType, OwnershipLogEntry,
};

use super::{
    CompanyMessageHandlerRegistry, ConversationOwnershipLog, ListingOwnershipStore,
    MarketplaceStore, MemberLifecycleStore, StoreTransaction,
};

/// Writes that should fail with a transient storage error
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// set_seller_participant fails for these conversations
    pub failing_conversations: HashSet<Uuid>,
    /// append_member_audit fails
    pub fail_member_audit: bool,
    /// begin() fails, as if the database were unreachable
    pub unavailable: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    organizations: HashMap<Uuid, Organization>,
    members: HashMap<Uuid, Member>,
    listings: HashMap<Uuid, Listing>,
    conversations: HashMap<Uuid, Conversation>,
    ownership_log: Vec<OwnershipLogEntry>,
    member_audit: Vec<MemberAuditEntry>,
    handlers: Vec<CompanyMessageHandler>,
    faults: FaultPlan,
}

/// Process-local MarketplaceStore
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Seeding (rows owned by external services: organizations, members,
    // listings and conversations are created elsewhere)
    // ------------------------------------------------------------------

    pub async fn insert_organization(&self, organization: Organization) {
        let mut state = self.state.lock().await;
        state.organizations.insert(organization.id, organization);
    }

    pub async fn insert_member(&self, member: Member) {
        let mut state = self.state.lock().await;
        state.members.insert(member.id, member);
    }

    pub async fn insert_listing(&self, listing: Listing) {
        let mut state = self.state.lock().await;
        state.listings.insert(listing.id, listing);
    }

    pub async fn insert_conversation(&self, conversation: Conversation) {
        let mut state = self.state.lock().await;
        state.conversations.insert(conversation.id, conversation);
    }

    pub async fn insert_handler(&self, handler: CompanyMessageHandler) {
        let mut state = self.state.lock().await;
        state
            .handlers
            .retain(|h| !(h.organization_id == handler.organization_id && h.member_id == handler.member_id));
        state.handlers.push(handler);
    }

    pub async fn set_faults(&self, faults: FaultPlan) {
        self.state.lock().await.faults = faults;
    }

    // ------------------------------------------------------------------
    // Committed-state inspection
    // ------------------------------------------------------------------

    pub async fn member(&self, member_id: Uuid) -> Option<Member> {
        self.state.lock().await.members.get(&member_id).cloned()
    }

    pub async fn listing(&self, listing_id: Uuid) -> Option<Listing> {
        self.state.lock().await.listings.get(&listing_id).cloned()
    }

    pub async fn listings(&self) -> Vec<Listing> {
        self.state.lock().await.listings.values().cloned().collect()
    }

    pub async fn conversation(&self, conversation_id: Uuid) -> Option<Conversation> {
        self.state
            .lock()
            .await
            .conversations
            .get(&conversation_id)
            .cloned()
    }

    pub async fn member_audit(&self, member_id: Uuid) -> Vec<MemberAuditEntry> {
        self.state
            .lock()
            .await
            .member_audit
            .iter()
            .filter(|e| e.member_id == member_id)
            .cloned()
            .collect()
    }

    pub async fn ownership_log(&self, conversation_id: Uuid) -> Vec<OwnershipLogEntry> {
        self.state
            .lock()
            .await
            .ownership_log
            .iter()
            .filter(|e| e.conversation_id == conversation_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MarketplaceStore for InMemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        if guard.faults.unavailable {
            return Err(AppError::transient("in-memory store marked unavailable"));
        }
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> AppResult<()> {
        if self.state.lock().await.faults.unavailable {
            return Err(AppError::transient("in-memory store marked unavailable"));
        }
        Ok(())
    }
}

/// Transaction over a private copy of the state
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl MemberLifecycleStore for InMemoryTransaction {
    async fn get_member(&mut self, member_id: Uuid) -> AppResult<Option<Member>> {
        Ok(self.working.members.get(&member_id).cloned())
    }

    async fn lock_member(&mut self, member_id: Uuid) -> AppResult<Option<Member>> {
        // The transaction already holds the store-wide lock
        self.get_member(member_id).await
    }

    async fn get_active_members(&mut self, organization_id: Uuid) -> AppResult<Vec<Member>> {
        let mut members: Vec<Member> = self
            .working
            .members
            .values()
            .filter(|m| m.belongs_to(organization_id) && m.is_active())
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.created_at, m.id));
        Ok(members)
    }

    async fn update_member_status(
        &mut self,
        member_id: Uuid,
        patch: &MemberStatusPatch,
    ) -> AppResult<()> {
        let member = self
            .working
            .members
            .get_mut(&member_id)
            .ok_or_else(|| AppError::not_found(format!("member {}", member_id)))?;

        match patch {
            MemberStatusPatch::Removed {
                removed_by,
                removal_date,
                reason,
            } => {
                member.status = MemberStatus::Removed;
                member.role = marketplace_types::MemberRole::InactiveMember;
                member.removal_date = Some(*removal_date);
                member.removed_by = Some(*removed_by);
                member.removal_reason = reason.clone();
            }
            MemberStatusPatch::Reactivated {
                role,
                reactivated_by,
                reactivated_at,
            } => {
                member.status = MemberStatus::Active;
                member.role = *role;
                member.removal_date = None;
                member.removed_by = None;
                member.removal_reason = None;
                member.reactivated_by = Some(*reactivated_by);
                member.reactivated_at = Some(*reactivated_at);
                member.reactivation_count += 1;
            }
            MemberStatusPatch::RoleChanged { role } => {
                member.role = *role;
            }
        }
        Ok(())
    }

    async fn count_members_by_status(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Vec<(MemberStatus, i64)>> {
        let mut counts: HashMap<MemberStatus, i64> = HashMap::new();
        for member in self
            .working
            .members
            .values()
            .filter(|m| m.belongs_to(organization_id))
        {
            *counts.entry(member.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn get_organization(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Option<Organization>> {
        Ok(self.working.organizations.get(&organization_id).cloned())
    }

    async fn append_member_audit(&mut self, entry: &MemberAuditEntry) -> AppResult<()> {
        if self.working.faults.fail_member_audit {
            return Err(AppError::transient("member_audit write failed"));
        }
        self.working.member_audit.push(entry.clone());
        Ok(())
    }

    async fn latest_member_audit(
        &mut self,
        member_id: Uuid,
        action: AuditAction,
    ) -> AppResult<Option<MemberAuditEntry>> {
        Ok(self
            .working
            .member_audit
            .iter()
            .rev()
            .find(|e| e.member_id == member_id && e.action == action)
            .cloned())
    }

    async fn member_audit_history(&mut self, member_id: Uuid) -> AppResult<Vec<MemberAuditEntry>> {
        Ok(self
            .working
            .member_audit
            .iter()
            .filter(|e| e.member_id == member_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ListingOwnershipStore for InMemoryTransaction {
    async fn get_listing(&mut self, listing_id: Uuid) -> AppResult<Option<Listing>> {
        Ok(self.working.listings.get(&listing_id).cloned())
    }

    async fn lock_listing(&mut self, listing_id: Uuid) -> AppResult<Option<Listing>> {
        self.get_listing(listing_id).await
    }

    async fn get_active_listings_by_owner(&mut self, member_id: Uuid) -> AppResult<Vec<Listing>> {
        let mut listings: Vec<Listing> = self
            .working
            .listings
            .values()
            .filter(|l| l.current_owner_id == member_id && l.is_active())
            .cloned()
            .collect();
        listings.sort_by_key(|l| (l.created_at, l.id));
        Ok(listings)
    }

    async fn get_restorable_listings(&mut self, member_id: Uuid) -> AppResult<Vec<Listing>> {
        let mut listings: Vec<Listing> = self
            .working
            .listings
            .values()
            .filter(|l| {
                let suspended_own = l.current_owner_id == member_id
                    && l.current_owner_type == OwnerType::Member
                    && l.status == ListingStatus::SuspendedMemberRemoved;
                let held_by_company = l.original_owner_id == member_id
                    && l.current_owner_type == OwnerType::OrgHandler
                    && matches!(
                        l.status,
                        ListingStatus::Active | ListingStatus::SuspendedMemberRemoved
                    );
                suspended_own || held_by_company
            })
            .cloned()
            .collect();
        listings.sort_by_key(|l| (l.created_at, l.id));
        Ok(listings)
    }

    async fn set_listing_owner(
        &mut self,
        listing_id: Uuid,
        owner_id: Uuid,
        owner_type: OwnerType,
    ) -> AppResult<()> {
        let listing = self
            .working
            .listings
            .get_mut(&listing_id)
            .ok_or_else(|| AppError::not_found(format!("listing {}", listing_id)))?;
        listing.current_owner_id = owner_id;
        listing.current_owner_type = owner_type;
        listing.updated_at = Utc::now();
        Ok(())
    }

    async fn set_listing_status(
        &mut self,
        listing_id: Uuid,
        status: ListingStatus,
    ) -> AppResult<()> {
        let listing = self
            .working
            .listings
            .get_mut(&listing_id)
            .ok_or_else(|| AppError::not_found(format!("listing {}", listing_id)))?;
        listing.status = status;
        listing.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ConversationOwnershipLog for InMemoryTransaction {
    async fn conversations_for_listing(
        &mut self,
        listing_id: Uuid,
    ) -> AppResult<Vec<Conversation>> {
        let mut conversations: Vec<Conversation> = self
            .working
            .conversations
            .values()
            .filter(|c| c.listing_id == listing_id)
            .cloned()
            .collect();
        conversations.sort_by_key(|c| (c.created_at, c.id));
        Ok(conversations)
    }

    async fn get_conversation(&mut self, conversation_id: Uuid) -> AppResult<Option<Conversation>> {
        Ok(self.working.conversations.get(&conversation_id).cloned())
    }

    async fn lock_conversation(
        &mut self,
        conversation_id: Uuid,
    ) -> AppResult<Option<Conversation>> {
        self.get_conversation(conversation_id).await
    }

    async fn set_seller_participant(
        &mut self,
        conversation_id: Uuid,
        seller_id: Uuid,
    ) -> AppResult<()> {
        if self
            .working
            .faults
            .failing_conversations
            .contains(&conversation_id)
        {
            return Err(AppError::transient(format!(
                "conversation_participants write failed for {}",
                conversation_id
            )));
        }
        let conversation = self
            .working
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| AppError::not_found(format!("conversation {}", conversation_id)))?;
        conversation.seller_id = seller_id;
        Ok(())
    }

    async fn append_ownership_entry(&mut self, entry: &OwnershipLogEntry) -> AppResult<()> {
        self.working.ownership_log.push(entry.clone());
        Ok(())
    }

    async fn ownership_history(
        &mut self,
        conversation_id: Uuid,
    ) -> AppResult<Vec<OwnershipLogEntry>> {
        Ok(self
            .working
            .ownership_log
            .iter()
            .filter(|e| e.conversation_id == conversation_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CompanyMessageHandlerRegistry for InMemoryTransaction {
    async fn list_handlers(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Vec<CompanyMessageHandler>> {
        let mut handlers: Vec<CompanyMessageHandler> = self
            .working
            .handlers
            .iter()
            .filter(|h| h.organization_id == organization_id)
            .cloned()
            .collect();
        handlers.sort_by_key(|h| (h.created_at, h.member_id));
        Ok(handlers)
    }

    async fn get_handler(
        &mut self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<CompanyMessageHandler>> {
        Ok(self
            .working
            .handlers
            .iter()
            .find(|h| h.organization_id == organization_id && h.member_id == member_id)
            .cloned())
    }

    async fn upsert_handler(
        &mut self,
        handler: &CompanyMessageHandler,
    ) -> AppResult<CompanyMessageHandler> {
        if let Some(existing) = self.working.handlers.iter_mut().find(|h| {
            h.organization_id == handler.organization_id && h.member_id == handler.member_id
        }) {
            existing.is_active = handler.is_active;
            existing.can_handle_transferred = handler.can_handle_transferred;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        self.working.handlers.push(handler.clone());
        Ok(handler.clone())
    }

    async fn update_handler_flags(
        &mut self,
        organization_id: Uuid,
        member_id: Uuid,
        is_active: Option<bool>,
        can_handle_transferred: Option<bool>,
    ) -> AppResult<Option<CompanyMessageHandler>> {
        let Some(handler) = self
            .working
            .handlers
            .iter_mut()
            .find(|h| h.organization_id == organization_id && h.member_id == member_id)
        else {
            return Ok(None);
        };
        if let Some(is_active) = is_active {
            handler.is_active = is_active;
        }
        if let Some(can_handle_transferred) = can_handle_transferred {
            handler.can_handle_transferred = can_handle_transferred;
        }
        handler.updated_at = Utc::now();
        Ok(Some(handler.clone()))
    }

    async fn delete_handler(&mut self, organization_id: Uuid, member_id: Uuid) -> AppResult<bool> {
        let before = self.working.handlers.len();
        self.working
            .handlers
            .retain(|h| !(h.organization_id == organization_id && h.member_id == member_id));
        Ok(self.working.handlers.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_types::MemberRole;

    fn member(organization_id: Uuid) -> Member {
        Member {
            id: Uuid::new_v4(),
            organization_id: Some(organization_id),
            email: "seller@example.com".to_string(),
            display_name: "Seller".to_string(),
            status: MemberStatus::Active,
            role: MemberRole::Member,
            removal_date: None,
            removal_reason: None,
            removed_by: None,
            reactivated_by: None,
            reactivated_at: None,
            reactivation_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_changes() {
        let store = InMemoryStore::new();
        let m = member(Uuid::new_v4());
        store.insert_member(m.clone()).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.update_member_status(
                m.id,
                &MemberStatusPatch::RoleChanged {
                    role: MemberRole::Admin,
                },
            )
            .await
            .unwrap();
            // dropped without commit
        }

        assert_eq!(store.member(m.id).await.unwrap().role, MemberRole::Member);
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = InMemoryStore::new();
        let m = member(Uuid::new_v4());
        store.insert_member(m.clone()).await;

        let mut tx = store.begin().await.unwrap();
        tx.update_member_status(
            m.id,
            &MemberStatusPatch::Removed {
                removed_by: Uuid::new_v4(),
                removal_date: Utc::now(),
                reason: Some("left the company".to_string()),
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let stored = store.member(m.id).await.unwrap();
        assert_eq!(stored.status, MemberStatus::Removed);
        assert_eq!(stored.role, MemberRole::InactiveMember);
        assert_eq!(stored.removal_reason.as_deref(), Some("left the company"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_original_registration_time() {
        let store = InMemoryStore::new();
        let org = Uuid::new_v4();
        let first = CompanyMessageHandler::new(org, Uuid::new_v4(), false);

        let mut tx = store.begin().await.unwrap();
        tx.upsert_handler(&first).await.unwrap();
        let mut again = first.clone();
        again.can_handle_transferred = true;
        again.created_at = Utc::now() + chrono::Duration::hours(1);
        let stored = tx.upsert_handler(&again).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(stored.created_at, first.created_at);
        assert!(stored.can_handle_transferred);
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_begin() {
        let store = InMemoryStore::new();
        store
            .set_faults(FaultPlan {
                unavailable: true,
                ..Default::default()
            })
            .await;
        let err = store.begin().await.err().unwrap();
        assert!(err.is_retryable());
    }
}
