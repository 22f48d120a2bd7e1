#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use marketplace_config::StorageBackend;
use marketplace_error::{AppError, AppResult};
use marketplace_server::{
    context::AppContext,
    facade::MessagingFacade,
    notifications::{MemberNotifier, MemberReactivationNotification, MemberRemovalNotification},
    routes::create_router,
    store::{InMemoryStore, MarketplaceStore},
};
use marketplace_types::{
    CompanyMessageHandler, Conversation, Listing, ListingStatus, Member, MemberRole, MemberStatus,
    Organization, OwnerType,
};

/// Notifier that records every payload it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub removals: Mutex<Vec<MemberRemovalNotification>>,
    pub reactivations: Mutex<Vec<MemberReactivationNotification>>,
}

impl RecordingNotifier {
    pub fn removal_count(&self) -> usize {
        self.removals.lock().unwrap().len()
    }

    pub fn reactivation_count(&self) -> usize {
        self.reactivations.lock().unwrap().len()
    }
}

#[async_trait]
impl MemberNotifier for RecordingNotifier {
    async fn send_member_removal_notification(
        &self,
        payload: &MemberRemovalNotification,
    ) -> AppResult<()> {
        self.removals.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn send_member_reactivation_notification(
        &self,
        payload: &MemberReactivationNotification,
    ) -> AppResult<()> {
        self.reactivations.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Notifier whose email service is always down
pub struct FailingNotifier;

#[async_trait]
impl MemberNotifier for FailingNotifier {
    async fn send_member_removal_notification(
        &self,
        _payload: &MemberRemovalNotification,
    ) -> AppResult<()> {
        Err(AppError::notification("email service unreachable"))
    }

    async fn send_member_reactivation_notification(
        &self,
        _payload: &MemberReactivationNotification,
    ) -> AppResult<()> {
        Err(AppError::notification("email service unreachable"))
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(offset_secs)
}

pub fn member(organization_id: Option<Uuid>, role: MemberRole, offset_secs: i64) -> Member {
    let id = Uuid::new_v4();
    Member {
        id,
        organization_id,
        email: format!("{}@example.com", id.simple()),
        display_name: format!("Member {}", &id.simple().to_string()[..8]),
        status: MemberStatus::Active,
        role,
        removal_date: None,
        removal_reason: None,
        removed_by: None,
        reactivated_by: None,
        reactivated_at: None,
        reactivation_count: 0,
        created_at: at(offset_secs),
    }
}

pub fn listing(organization_id: Option<Uuid>, owner_id: Uuid, offset_secs: i64) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        organization_id,
        title: "Used forklift".to_string(),
        original_owner_id: owner_id,
        current_owner_id: owner_id,
        current_owner_type: OwnerType::Member,
        status: ListingStatus::Active,
        created_at: at(offset_secs),
        updated_at: at(offset_secs),
    }
}

pub fn conversation(listing_id: Uuid, seller_id: Uuid, offset_secs: i64) -> Conversation {
    Conversation {
        id: Uuid::new_v4(),
        listing_id,
        seller_id,
        buyer_ids: vec![Uuid::new_v4()],
        created_at: at(offset_secs),
    }
}

/// One organization with an owner, an admin, a seller holding two listings
/// (three conversations in total) and a colleague with nothing.
pub struct TestWorld {
    pub store: InMemoryStore,
    pub facade: Arc<MessagingFacade>,
    pub notifier: Arc<RecordingNotifier>,
    pub org: Uuid,
    pub owner: Uuid,
    pub admin: Uuid,
    pub seller: Uuid,
    pub colleague: Uuid,
    pub listings: Vec<Uuid>,
    pub conversations: Vec<Uuid>,
}

impl TestWorld {
    pub async fn conversations_of(&self, listing_id: Uuid) -> Vec<Conversation> {
        let mut found = Vec::new();
        for id in &self.conversations {
            if let Some(c) = self.store.conversation(*id).await
                && c.listing_id == listing_id
            {
                found.push(c);
            }
        }
        found
    }

    /// Register `member_id` as a designated company message handler
    pub async fn designate_handler(&self, member_id: Uuid, offset_secs: i64) {
        let mut handler = CompanyMessageHandler::new(self.org, member_id, true);
        handler.created_at = at(offset_secs);
        handler.updated_at = at(offset_secs);
        self.store.insert_handler(handler).await;
    }

    pub fn router(&self) -> axum::Router {
        let context = Arc::new(AppContext::new(self.facade.clone(), StorageBackend::Memory));
        create_router(context)
    }
}

pub async fn spawn_world() -> TestWorld {
    let notifier = Arc::new(RecordingNotifier::default());
    spawn_world_with(notifier.clone(), notifier).await
}

pub async fn spawn_world_with_notifier(notifier: Arc<dyn MemberNotifier>) -> TestWorld {
    spawn_world_with(notifier, Arc::new(RecordingNotifier::default())).await
}

async fn spawn_world_with(
    notifier: Arc<dyn MemberNotifier>,
    recording: Arc<RecordingNotifier>,
) -> TestWorld {
    let store = InMemoryStore::new();
    let org = Uuid::new_v4();
    store
        .insert_organization(Organization {
            id: org,
            name: "Nordic Machinery AB".to_string(),
        })
        .await;

    let owner = member(Some(org), MemberRole::Owner, 0);
    let admin = member(Some(org), MemberRole::Admin, 10);
    let seller = member(Some(org), MemberRole::Member, 20);
    let colleague = member(Some(org), MemberRole::Member, 30);

    let first = listing(Some(org), seller.id, 100);
    let second = listing(Some(org), seller.id, 200);

    let conversations = vec![
        conversation(first.id, seller.id, 300),
        conversation(first.id, seller.id, 310),
        conversation(second.id, seller.id, 320),
    ];

    for m in [&owner, &admin, &seller, &colleague] {
        store.insert_member(m.clone()).await;
    }
    for l in [&first, &second] {
        store.insert_listing(l.clone()).await;
    }
    for c in &conversations {
        store.insert_conversation(c.clone()).await;
    }

    let shared: Arc<dyn MarketplaceStore> = Arc::new(store.clone());
    let facade = Arc::new(MessagingFacade::new(shared, notifier));

    TestWorld {
        store,
        facade,
        notifier: recording,
        org,
        owner: owner.id,
        admin: admin.id,
        seller: seller.id,
        colleague: colleague.id,
        listings: vec![first.id, second.id],
        conversations: conversations.iter().map(|c| c.id).collect(),
    }
}
