// ============================================================================
// Messaging Facade
// ============================================================================
//
// The operation surface consumed by request handlers:
// - removeMember / reactivateMember / changeMemberRole   (coordinator)
// - transferListing                                      (coordinator)
// - resolveMessageRecipient                              (resolver)
// - getConversationOwnershipHistory / getMemberAuditHistory
// - getMemberStatistics
// - company message handler registry management
//
// Upstream authentication supplies the actor id; role and organization are
// checked here or in the coordinator.
//
// ============================================================================

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use marketplace_error::{AppError, AppResult};
use marketplace_types::{
    CompanyMessageHandler, MemberAuditEntry, MemberRole, MemberStatistics, OwnershipLogEntry,
};

use crate::audit::{AuditEventType, AuditLogger};
use crate::lifecycle::{
    ListingTransferResult, MemberLifecycleCoordinator, ReactivationOptions, ReactivationResult,
    RemovalOptions, RemovalResult, RoleChangeResult, permissions,
};
use crate::notifications::MemberNotifier;
use crate::routing::{MessageRoutingResolver, RecipientInfo};
use crate::store::{
    CompanyMessageHandlerRegistry, ConversationOwnershipLog, MarketplaceStore,
    MemberLifecycleStore, StoreTransaction,
};

/// Registration request for a company message handler
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterHandlerRequest {
    pub member_id: Uuid,
    #[serde(default = "default_can_handle_transferred")]
    pub can_handle_transferred: bool,
}

fn default_can_handle_transferred() -> bool {
    true
}

/// Partial update of a handler registration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHandlerRequest {
    pub is_active: Option<bool>,
    pub can_handle_transferred: Option<bool>,
}

pub struct MessagingFacade {
    store: Arc<dyn MarketplaceStore>,
    coordinator: MemberLifecycleCoordinator,
    resolver: Arc<MessageRoutingResolver>,
}

impl MessagingFacade {
    pub fn new(store: Arc<dyn MarketplaceStore>, notifier: Arc<dyn MemberNotifier>) -> Self {
        let resolver = Arc::new(MessageRoutingResolver::new(store.clone()));
        let coordinator =
            MemberLifecycleCoordinator::new(store.clone(), resolver.clone(), notifier);
        Self {
            store,
            coordinator,
            resolver,
        }
    }

    pub fn resolver(&self) -> &MessageRoutingResolver {
        &self.resolver
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    // ========================================================================
    // Member lifecycle
    // ========================================================================

    pub async fn remove_member(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: RemovalOptions,
    ) -> AppResult<RemovalResult> {
        self.coordinator
            .remove_member(member_id, actor_id, options)
            .await
    }

    pub async fn reactivate_member(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: ReactivationOptions,
    ) -> AppResult<ReactivationResult> {
        self.coordinator
            .reactivate_member(member_id, actor_id, options)
            .await
    }

    pub async fn change_member_role(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        new_role: MemberRole,
    ) -> AppResult<RoleChangeResult> {
        self.coordinator
            .change_member_role(member_id, actor_id, new_role)
            .await
    }

    pub async fn transfer_listing(
        &self,
        listing_id: Uuid,
        actor_id: Uuid,
        new_owner_id: Uuid,
    ) -> AppResult<ListingTransferResult> {
        self.coordinator
            .transfer_listing(listing_id, actor_id, new_owner_id)
            .await
    }

    // ========================================================================
    // Routing and history
    // ========================================================================

    pub async fn resolve_message_recipient(&self, listing_id: Uuid) -> AppResult<RecipientInfo> {
        self.resolver.resolve_recipient(listing_id).await
    }

    /// Seller participant history of a conversation, oldest first
    pub async fn get_conversation_ownership_history(
        &self,
        conversation_id: Uuid,
    ) -> AppResult<Vec<OwnershipLogEntry>> {
        let mut tx = self.store.begin().await?;
        if tx.get_conversation(conversation_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "conversation {}",
                conversation_id
            )));
        }
        let history = tx.ownership_history(conversation_id).await?;
        tx.rollback().await?;
        Ok(history)
    }

    /// Audit trail of a member; visible to the member and to managers of
    /// their organization
    pub async fn get_member_audit_history(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<Vec<MemberAuditEntry>> {
        let mut tx = self.store.begin().await?;

        let member = tx
            .get_member(member_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("member {}", member_id)))?;
        if actor_id != member_id {
            let actor = permissions::require_actor(tx.get_member(actor_id).await?)?;
            let organization_id = member
                .organization_id
                .ok_or_else(|| AppError::permission_denied("member has no organization"))?;
            permissions::ensure_org_manager(&actor, organization_id)?;
        }

        let history = tx.member_audit_history(member_id).await?;
        tx.rollback().await?;
        Ok(history)
    }

    pub async fn get_member_statistics(&self, organization_id: Uuid) -> AppResult<MemberStatistics> {
        let mut tx = self.store.begin().await?;
        if tx.get_organization(organization_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "organization {}",
                organization_id
            )));
        }
        let counts = tx.count_members_by_status(organization_id).await?;
        tx.rollback().await?;
        Ok(MemberStatistics::from_counts(organization_id, &counts))
    }

    // ========================================================================
    // Company message handler registry
    // ========================================================================

    pub async fn list_message_handlers(
        &self,
        organization_id: Uuid,
    ) -> AppResult<Vec<CompanyMessageHandler>> {
        let mut tx = self.store.begin().await?;
        if tx.get_organization(organization_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "organization {}",
                organization_id
            )));
        }
        let handlers = tx.list_handlers(organization_id).await?;
        tx.rollback().await?;
        Ok(handlers)
    }

    /// Register (or re-activate) a member as company message handler
    pub async fn register_message_handler(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        request: RegisterHandlerRequest,
    ) -> AppResult<CompanyMessageHandler> {
        let mut tx = self.store.begin().await?;
        self.authorize_registry_change(tx.as_mut(), organization_id, actor_id)
            .await?;

        let eligible = tx
            .get_member(request.member_id)
            .await?
            .is_some_and(|m| m.is_active() && m.belongs_to(organization_id));
        if !eligible {
            return Err(AppError::validation(format!(
                "{} is not an active member of the organization",
                request.member_id
            )));
        }

        let handler = tx
            .upsert_handler(&CompanyMessageHandler::new(
                organization_id,
                request.member_id,
                request.can_handle_transferred,
            ))
            .await?;
        tx.commit().await?;

        AuditLogger::log_handler_change(
            AuditEventType::HandlerRegistered,
            actor_id,
            organization_id,
            request.member_id,
            json!({ "can_handle_transferred": handler.can_handle_transferred }),
        );

        Ok(handler)
    }

    pub async fn update_message_handler(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
        request: UpdateHandlerRequest,
    ) -> AppResult<CompanyMessageHandler> {
        if request.is_active.is_none() && request.can_handle_transferred.is_none() {
            return Err(AppError::validation(
                "at least one of isActive, canHandleTransferred is required",
            ));
        }

        let mut tx = self.store.begin().await?;
        self.authorize_registry_change(tx.as_mut(), organization_id, actor_id)
            .await?;

        let handler = tx
            .update_handler_flags(
                organization_id,
                member_id,
                request.is_active,
                request.can_handle_transferred,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("message handler {}", member_id)))?;
        tx.commit().await?;

        AuditLogger::log_handler_change(
            AuditEventType::HandlerUpdated,
            actor_id,
            organization_id,
            member_id,
            json!({
                "is_active": handler.is_active,
                "can_handle_transferred": handler.can_handle_transferred,
            }),
        );

        Ok(handler)
    }

    pub async fn remove_message_handler(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        self.authorize_registry_change(tx.as_mut(), organization_id, actor_id)
            .await?;

        if !tx.delete_handler(organization_id, member_id).await? {
            return Err(AppError::not_found(format!("message handler {}", member_id)));
        }
        tx.commit().await?;

        AuditLogger::log_handler_change(
            AuditEventType::HandlerRemoved,
            actor_id,
            organization_id,
            member_id,
            serde_json::Value::Null,
        );

        Ok(())
    }

    async fn authorize_registry_change(
        &self,
        tx: &mut dyn StoreTransaction,
        organization_id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<()> {
        if tx.get_organization(organization_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "organization {}",
                organization_id
            )));
        }
        let actor = permissions::require_actor(tx.get_member(actor_id).await?)?;
        permissions::ensure_org_manager(&actor, organization_id)
    }
}
