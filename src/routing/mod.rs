// ============================================================================
// Message Routing Resolver
// ============================================================================
//
// Computes who should receive a buyer's message about a listing, and keeps
// the seller participant of the listing's conversations in step with the
// listing's current owner.
//
// resolve_recipient always works from current listing/member/handler state,
// never from the conversation participant rows. Those rows are updated
// best-effort after the core mutation commits and may briefly lag; the live
// computation here is what keeps that window safe.
//
// Propagation runs one transaction per conversation, so one failing
// conversation never blocks or rolls back the others.
//
// ============================================================================

mod selection;

pub use selection::{FallbackCandidate, FallbackTier, select_fallback};

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use marketplace_error::{AppError, AppResult};
use marketplace_metrics::{
    CONVERSATION_OWNERSHIP_CHANGES_TOTAL, PROPAGATION_FAILURES_TOTAL,
    RECIPIENT_RESOLUTIONS_TOTAL,
};
use marketplace_types::{OwnerType, OwnershipChangeReason, OwnershipLogEntry};

use crate::audit::AuditLogger;
use crate::store::{
    CompanyMessageHandlerRegistry, ConversationOwnershipLog, ListingOwnershipStore,
    MarketplaceStore, MemberLifecycleStore, StoreTransaction,
};

/// Who answers messages about a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInfo {
    pub recipient_id: Uuid,
    /// `member` when the listing's own owner answers, `org_handler` when a
    /// company fallback does
    pub recipient_type: OwnerType,
    pub is_original_seller: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// A conversation (or a whole listing) that propagation could not update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationFailure {
    pub listing_id: Uuid,
    /// None when the listing's conversations could not even be loaded
    pub conversation_id: Option<Uuid>,
    pub error: String,
}

/// Outcome of a best-effort propagation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationReport {
    /// Ownership log entries written, one per changed conversation
    pub updates: Vec<OwnershipLogEntry>,
    /// Conversations whose seller already matched the target
    pub unchanged: usize,
    pub failures: Vec<PropagationFailure>,
}

impl PropagationReport {
    pub fn merge(&mut self, other: PropagationReport) {
        self.updates.extend(other.updates);
        self.unchanged += other.unchanged;
        self.failures.extend(other.failures);
    }

    /// Record a listing whose conversations were never reached
    pub fn listing_failed(&mut self, listing_id: Uuid, error: &AppError) {
        PROPAGATION_FAILURES_TOTAL.inc();
        tracing::warn!(
            listing_id = %listing_id,
            error = %error,
            "Conversation ownership propagation skipped listing"
        );
        self.failures.push(PropagationFailure {
            listing_id,
            conversation_id: None,
            error: error.to_string(),
        });
    }
}

/// Company fallback for an organization, looked up inside an open
/// transaction.
pub async fn find_company_fallback(
    tx: &mut dyn StoreTransaction,
    organization_id: Uuid,
    exclude: Option<Uuid>,
) -> AppResult<Option<FallbackCandidate>> {
    let handlers = tx.list_handlers(organization_id).await?;
    let active_members = tx.get_active_members(organization_id).await?;
    Ok(select_fallback(&handlers, &active_members, exclude))
}

pub struct MessageRoutingResolver {
    store: Arc<dyn MarketplaceStore>,
}

impl MessageRoutingResolver {
    pub fn new(store: Arc<dyn MarketplaceStore>) -> Self {
        Self { store }
    }

    /// Current legitimate recipient for messages about a listing.
    ///
    /// Read-only and idempotent: with no intervening state change, repeated
    /// calls return the same recipient.
    pub async fn resolve_recipient(&self, listing_id: Uuid) -> AppResult<RecipientInfo> {
        let mut tx = self.store.begin().await?;

        let listing = tx
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("listing {}", listing_id)))?;
        let owner = tx.get_member(listing.current_owner_id).await?;

        let owner_answers = listing.current_owner_type == OwnerType::Member
            && (listing.organization_id.is_none()
                || owner.as_ref().is_some_and(|m| m.is_active()));

        if owner_answers {
            let company_name = match listing.organization_id {
                Some(org) => tx.get_organization(org).await?.map(|o| o.name),
                None => None,
            };
            tx.rollback().await?;

            RECIPIENT_RESOLUTIONS_TOTAL.with_label_values(&["owner"]).inc();
            return Ok(RecipientInfo {
                recipient_id: listing.current_owner_id,
                recipient_type: OwnerType::Member,
                is_original_seller: listing.is_owned_by_original_seller(),
                company_name,
            });
        }

        let no_recipient = || {
            RECIPIENT_RESOLUTIONS_TOTAL
                .with_label_values(&["no_recipient"])
                .inc();
            AppError::NoValidRecipient {
                listing_id,
                organization_id: listing.organization_id,
            }
        };

        let Some(organization_id) = listing.organization_id else {
            return Err(no_recipient());
        };

        let Some(candidate) = find_company_fallback(tx.as_mut(), organization_id, None).await?
        else {
            return Err(no_recipient());
        };

        let company_name = tx.get_organization(organization_id).await?.map(|o| o.name);
        tx.rollback().await?;

        RECIPIENT_RESOLUTIONS_TOTAL
            .with_label_values(&[candidate.tier.as_str()])
            .inc();

        tracing::debug!(
            listing_id = %listing_id,
            recipient_id = %candidate.member_id,
            tier = candidate.tier.as_str(),
            "Resolved message recipient through company fallback"
        );

        Ok(RecipientInfo {
            recipient_id: candidate.member_id,
            recipient_type: OwnerType::OrgHandler,
            is_original_seller: candidate.member_id == listing.original_owner_id,
            company_name,
        })
    }

    /// Company fallback recipient for an organization, ignoring `exclude`
    pub async fn resolve_company_fallback(
        &self,
        organization_id: Uuid,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<FallbackCandidate>> {
        let mut tx = self.store.begin().await?;
        let candidate = find_company_fallback(tx.as_mut(), organization_id, exclude).await?;
        tx.rollback().await?;
        Ok(candidate)
    }

    /// Point the seller participant of every conversation on the listing at
    /// `new_owner_id`.
    ///
    /// Each conversation is updated in its own transaction. Conversations
    /// already pointing at the target are left alone, so re-invoking with the
    /// same target is a no-op. Per-conversation failures are collected in the
    /// report; only a failure to list the conversations is returned as Err.
    pub async fn update_conversation_ownership(
        &self,
        listing_id: Uuid,
        new_owner_id: Uuid,
        reason: OwnershipChangeReason,
        changed_by: Option<Uuid>,
    ) -> AppResult<PropagationReport> {
        let conversation_ids: Vec<Uuid> = {
            let mut tx = self.store.begin().await?;
            let conversations = tx.conversations_for_listing(listing_id).await?;
            tx.rollback().await?;
            conversations.into_iter().map(|c| c.id).collect()
        };

        let mut report = PropagationReport::default();
        for conversation_id in conversation_ids {
            match self
                .reassign_seller(conversation_id, new_owner_id, reason, changed_by)
                .await
            {
                Ok(Some(entry)) => report.updates.push(entry),
                Ok(None) => report.unchanged += 1,
                Err(e) => {
                    PROPAGATION_FAILURES_TOTAL.inc();
                    tracing::warn!(
                        listing_id = %listing_id,
                        conversation_id = %conversation_id,
                        new_owner_id = %new_owner_id,
                        error = %e,
                        "Failed to update conversation seller, live fallback still routes correctly"
                    );
                    report.failures.push(PropagationFailure {
                        listing_id,
                        conversation_id: Some(conversation_id),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            listing_id = %listing_id,
            updated = report.updates.len(),
            unchanged = report.unchanged,
            failed = report.failures.len(),
            "Conversation ownership propagation finished"
        );

        Ok(report)
    }

    /// Hand the conversations of restored listings back to a reactivated
    /// member.
    pub async fn restore_conversation_ownership(
        &self,
        member_id: Uuid,
        listing_ids: &[Uuid],
        changed_by: Uuid,
    ) -> PropagationReport {
        let mut report = PropagationReport::default();
        for &listing_id in listing_ids {
            match self
                .update_conversation_ownership(
                    listing_id,
                    member_id,
                    OwnershipChangeReason::MemberReactivated,
                    Some(changed_by),
                )
                .await
            {
                Ok(listing_report) => report.merge(listing_report),
                Err(e) => report.listing_failed(listing_id, &e),
            }
        }
        report
    }

    async fn reassign_seller(
        &self,
        conversation_id: Uuid,
        new_owner_id: Uuid,
        reason: OwnershipChangeReason,
        changed_by: Option<Uuid>,
    ) -> AppResult<Option<OwnershipLogEntry>> {
        let mut tx = self.store.begin().await?;

        let conversation = tx
            .lock_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("conversation {}", conversation_id)))?;

        if conversation.seller_id == new_owner_id {
            tx.rollback().await?;
            return Ok(None);
        }

        let entry = OwnershipLogEntry::new(
            conversation_id,
            Some(conversation.seller_id),
            new_owner_id,
            reason,
            changed_by,
        );
        tx.append_ownership_entry(&entry).await?;
        tx.set_seller_participant(conversation_id, new_owner_id)
            .await?;
        tx.commit().await?;

        CONVERSATION_OWNERSHIP_CHANGES_TOTAL.inc();
        AuditLogger::log_ownership_change(&entry);

        Ok(Some(entry))
    }
}
