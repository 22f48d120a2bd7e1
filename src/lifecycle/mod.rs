// ============================================================================
// Member Lifecycle Coordinator
// ============================================================================
//
// Removal and reactivation are multi-step processes. Each step is its own
// function with its own failure domain:
//
// Removal:
//   1. reassign_listings  - transaction A: suspend, transfer or hand the
//                           member's active listings to the company
//   2. propagate_removal  - best-effort: conversation seller participants
//   3. commit_removal     - transaction B: member row + audit entry, plus the
//                           same disposition for any listing the member
//                           received after transaction A committed
//   4. notify_removal     - best-effort: removal email
//
// Listings a member only holds as company handler are never suspended as
// their own: they move on to the next company fallback, or stay
// OrgHandler-typed so the original seller can take them back.
//
// Reactivation:
//   1. commit_reactivation - one transaction: member row, restored listings,
//                            audit entry
//   2. conversation restore (best-effort)
//   3. welcome-back email (best-effort)
//
// A failing transaction rolls back in full and fails the request. Failures in
// the best-effort steps are returned on the result and never undo a commit;
// MessageRoutingResolver::resolve_recipient covers any conversation that was
// not updated.
//
// Propagation runs once per moved listing, after the transaction that moved
// it commits.
//
// ============================================================================

pub mod models;
pub mod permissions;
mod transfer;

pub use models::*;

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use marketplace_config::MAX_REASON_LENGTH;
use marketplace_error::{AppError, AppResult, StateConflict};
use marketplace_metrics::{
    MEMBER_REACTIVATIONS_TOTAL, MEMBER_REMOVALS_TOTAL, NOTIFICATION_FAILURES_TOTAL,
};
use marketplace_types::{
    AuditAction, Listing, ListingStatus, Member, MemberAuditEntry, MemberRole, MemberStatus,
    MemberStatusPatch, OwnerType, OwnershipChangeReason,
};

use crate::audit::AuditLogger;
use crate::notifications::{
    MemberNotifier, MemberReactivationNotification, MemberRemovalNotification,
};
use crate::routing::{MessageRoutingResolver, PropagationReport, find_company_fallback};
use crate::store::{
    ListingOwnershipStore, MarketplaceStore, MemberLifecycleStore, StoreTransaction,
};

/// What a removal transaction did with the member's listings
#[derive(Debug, Default)]
struct RemovalPlan {
    actions: Vec<ListingAction>,
    /// (listing, seller participant its conversations move to, reason)
    propagation: Vec<(Uuid, Uuid, OwnershipChangeReason)>,
}

impl RemovalPlan {
    fn merge(&mut self, other: RemovalPlan) {
        self.actions.extend(other.actions);
        self.propagation.extend(other.propagation);
    }
}

/// Member row as committed by transaction B
struct RemovedMember {
    member: Member,
    organization_name: Option<String>,
    removal_date: DateTime<Utc>,
    /// Listings received between transaction A and B
    late_listings: RemovalPlan,
}

struct ReactivatedMember {
    member: Member,
    role: MemberRole,
    restored_listings: Vec<Uuid>,
    organization_name: Option<String>,
    reactivated_at: DateTime<Utc>,
}

enum Disposition {
    Transfer(Uuid),
    Suspend,
    HandToCompany,
}

/// Decide what happens to the member's own listings. With `strict` an
/// ineligible transfer target is rejected, otherwise it degrades to
/// suspension.
async fn choose_disposition(
    tx: &mut dyn StoreTransaction,
    options: &RemovalOptions,
    organization_id: Uuid,
    strict: bool,
) -> AppResult<Disposition> {
    match options.transfer_to {
        Some(new_owner_id) => {
            let eligible = tx
                .lock_member(new_owner_id)
                .await?
                .is_some_and(|m| m.is_active() && m.belongs_to(organization_id));
            if eligible {
                Ok(Disposition::Transfer(new_owner_id))
            } else if strict {
                Err(StateConflict::InvalidTransferTarget(format!(
                    "{} is not an active member of the organization",
                    new_owner_id
                ))
                .into())
            } else {
                Ok(Disposition::Suspend)
            }
        }
        None if options.suspend_listings => Ok(Disposition::Suspend),
        None => Ok(Disposition::HandToCompany),
    }
}

/// Move a removed member's active listings inside an open transaction.
///
/// Own listings follow `disposition`. Listings the member holds as company
/// handler go to the next company fallback whatever the disposition, and are
/// suspended without losing their OrgHandler type when there is none. With
/// `strict`, handing own listings to a company without an eligible handler is
/// rejected; otherwise they are suspended.
async fn dispose_listings(
    tx: &mut dyn StoreTransaction,
    member_id: Uuid,
    organization_id: Uuid,
    disposition: &Disposition,
    listings: Vec<Listing>,
    strict: bool,
) -> AppResult<RemovalPlan> {
    let mut plan = RemovalPlan::default();

    let needs_fallback = !matches!(disposition, Disposition::Transfer(_))
        || listings
            .iter()
            .any(|l| l.current_owner_type == OwnerType::OrgHandler);
    let fallback = if listings.is_empty() || !needs_fallback {
        None
    } else {
        find_company_fallback(tx, organization_id, Some(member_id))
            .await?
            .map(|candidate| candidate.member_id)
    };

    if strict && fallback.is_none() && matches!(disposition, Disposition::HandToCompany) {
        if let Some(own) = listings
            .iter()
            .find(|l| l.current_owner_type == OwnerType::Member)
        {
            return Err(AppError::NoValidRecipient {
                listing_id: own.id,
                organization_id: Some(organization_id),
            });
        }
    }

    for listing in listings {
        let held_for_company = listing.current_owner_type == OwnerType::OrgHandler;
        let destination = match (disposition, fallback) {
            _ if held_for_company => fallback.map(|handler_id| {
                (
                    handler_id,
                    OwnerType::OrgHandler,
                    ListingActionKind::HandedToCompany,
                    OwnershipChangeReason::MemberRemovedFallback,
                )
            }),
            (Disposition::Transfer(new_owner_id), _) => Some((
                *new_owner_id,
                OwnerType::Member,
                ListingActionKind::Transferred,
                OwnershipChangeReason::MemberRemovedTransfer,
            )),
            (Disposition::HandToCompany, Some(handler_id)) => Some((
                handler_id,
                OwnerType::OrgHandler,
                ListingActionKind::HandedToCompany,
                OwnershipChangeReason::MemberRemovedFallback,
            )),
            _ => None,
        };

        let action = match destination {
            Some((new_owner_id, owner_type, kind, reason)) => {
                tx.set_listing_owner(listing.id, new_owner_id, owner_type)
                    .await?;
                plan.propagation.push((listing.id, new_owner_id, reason));
                ListingAction {
                    listing_id: listing.id,
                    action: kind,
                    previous_owner_id: listing.current_owner_id,
                    current_owner_id: new_owner_id,
                    current_owner_type: owner_type,
                    status: ListingStatus::Active,
                }
            }
            None => {
                tx.set_listing_status(listing.id, ListingStatus::SuspendedMemberRemoved)
                    .await?;
                if let Some(handler_id) = fallback {
                    plan.propagation.push((
                        listing.id,
                        handler_id,
                        OwnershipChangeReason::MemberRemovedFallback,
                    ));
                }
                ListingAction {
                    listing_id: listing.id,
                    action: ListingActionKind::Suspended,
                    previous_owner_id: listing.current_owner_id,
                    current_owner_id: listing.current_owner_id,
                    current_owner_type: listing.current_owner_type,
                    status: ListingStatus::SuspendedMemberRemoved,
                }
            }
        };
        plan.actions.push(action);
    }

    Ok(plan)
}

fn outcome_label<T>(result: &AppResult<T>) -> &'static str {
    match result {
        Ok(_) => "completed",
        Err(e) if e.status_code().is_server_error() => "failed",
        Err(_) => "rejected",
    }
}

fn validate_reason(reason: Option<&str>) -> AppResult<()> {
    if reason.is_some_and(|r| r.chars().count() > MAX_REASON_LENGTH) {
        return Err(AppError::validation(format!(
            "reason must be at most {} characters",
            MAX_REASON_LENGTH
        )));
    }
    Ok(())
}

/// Role given back on reactivation when the caller does not choose one
fn restored_role(previous: Option<MemberRole>) -> MemberRole {
    match previous {
        Some(role) if role.is_assignable() => role,
        _ => MemberRole::Member,
    }
}

async fn organization_name(
    tx: &mut dyn StoreTransaction,
    organization_id: Option<Uuid>,
) -> AppResult<Option<String>> {
    match organization_id {
        Some(org) => Ok(tx.get_organization(org).await?.map(|o| o.name)),
        None => Ok(None),
    }
}

pub struct MemberLifecycleCoordinator {
    store: Arc<dyn MarketplaceStore>,
    resolver: Arc<MessageRoutingResolver>,
    notifier: Arc<dyn MemberNotifier>,
}

impl MemberLifecycleCoordinator {
    pub fn new(
        store: Arc<dyn MarketplaceStore>,
        resolver: Arc<MessageRoutingResolver>,
        notifier: Arc<dyn MemberNotifier>,
    ) -> Self {
        Self {
            store,
            resolver,
            notifier,
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a member from their organization.
    ///
    /// Rejected without any mutation when the actor is not an owner/admin of
    /// the member's organization, the member is the owner, the member is
    /// already removed, or the transfer target is not an active member of the
    /// same organization.
    pub async fn remove_member(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: RemovalOptions,
    ) -> AppResult<RemovalResult> {
        let result = self.run_removal(member_id, actor_id, options).await;
        MEMBER_REMOVALS_TOTAL
            .with_label_values(&[outcome_label(&result)])
            .inc();
        result
    }

    async fn run_removal(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: RemovalOptions,
    ) -> AppResult<RemovalResult> {
        validate_reason(options.reason.as_deref())?;
        if options.transfer_to == Some(member_id) {
            return Err(StateConflict::InvalidTransferTarget(
                "listings cannot be transferred to the member being removed".to_string(),
            )
            .into());
        }

        let mut plan = self.reassign_listings(member_id, actor_id, &options).await?;

        let mut propagation = self.propagate_removal(&plan, actor_id).await;

        let mut removed = self
            .commit_removal(member_id, actor_id, &options, plan.actions.len())
            .await?;

        let late = std::mem::take(&mut removed.late_listings);
        if !late.actions.is_empty() {
            propagation.merge(self.propagate_removal(&late, actor_id).await);
            plan.merge(late);
        }

        tracing::info!(
            member_id = %member_id,
            actor_id = %actor_id,
            listings = plan.actions.len(),
            conversation_updates = propagation.updates.len(),
            propagation_failures = propagation.failures.len(),
            "Member removed"
        );

        let notification = self.notify_removal(&removed, actor_id, &options).await;

        Ok(RemovalResult {
            member_id,
            listing_actions: plan.actions,
            conversation_updates: propagation.updates,
            propagation_failures: propagation.failures,
            notification,
            can_reactivate: true,
        })
    }

    /// Transaction A: validate and move the member's active listings
    async fn reassign_listings(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: &RemovalOptions,
    ) -> AppResult<RemovalPlan> {
        let mut tx = self.store.begin().await?;

        let target = tx
            .lock_member(member_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("member {}", member_id)))?;
        let actor = permissions::require_actor(tx.get_member(actor_id).await?)?;
        let organization_id = permissions::ensure_can_manage(&actor, &target)?;

        if target.status == MemberStatus::Removed {
            return Err(StateConflict::AlreadyRemoved(member_id).into());
        }

        let disposition = choose_disposition(tx.as_mut(), options, organization_id, true).await?;

        let listings = tx.get_active_listings_by_owner(member_id).await?;
        let plan = dispose_listings(
            tx.as_mut(),
            member_id,
            organization_id,
            &disposition,
            listings,
            true,
        )
        .await?;

        tx.commit().await?;

        if plan.propagation.len() < plan.actions.len() {
            tracing::warn!(
                member_id = %member_id,
                organization_id = %organization_id,
                listings = plan.actions.len() - plan.propagation.len(),
                "No company fallback for suspended listings, conversations keep the removed seller"
            );
        }

        Ok(plan)
    }

    /// Best-effort: move conversation seller participants to the listings'
    /// new handler
    async fn propagate_removal(&self, plan: &RemovalPlan, actor_id: Uuid) -> PropagationReport {
        let mut report = PropagationReport::default();
        for &(listing_id, new_owner_id, reason) in &plan.propagation {
            match self
                .resolver
                .update_conversation_ownership(listing_id, new_owner_id, reason, Some(actor_id))
                .await
            {
                Ok(listing_report) => report.merge(listing_report),
                Err(e) => report.listing_failed(listing_id, &e),
            }
        }
        report
    }

    /// Transaction B: flip the member row and write the audit entry.
    ///
    /// Re-locks the member and re-checks its status, so of two racing
    /// removals exactly one reaches this point successfully. Listings the
    /// member received after transaction A are moved here, under the member
    /// lock, so no active listing is left with a removed owner.
    async fn commit_removal(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: &RemovalOptions,
        affected_listings: usize,
    ) -> AppResult<RemovedMember> {
        let mut tx = self.store.begin().await?;

        let member = tx
            .lock_member(member_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("member {}", member_id)))?;
        if member.status == MemberStatus::Removed {
            return Err(StateConflict::AlreadyRemoved(member_id).into());
        }

        let late = tx.get_active_listings_by_owner(member_id).await?;
        let late_listings = match member.organization_id {
            Some(organization_id) if !late.is_empty() => {
                let disposition =
                    choose_disposition(tx.as_mut(), options, organization_id, false).await?;
                dispose_listings(
                    tx.as_mut(),
                    member_id,
                    organization_id,
                    &disposition,
                    late,
                    false,
                )
                .await?
            }
            _ => RemovalPlan::default(),
        };
        if !late_listings.actions.is_empty() {
            tracing::warn!(
                member_id = %member_id,
                listings = late_listings.actions.len(),
                "Listings received during removal were reassigned"
            );
        }

        let removal_date = Utc::now();
        tx.update_member_status(
            member_id,
            &MemberStatusPatch::Removed {
                removed_by: actor_id,
                removal_date,
                reason: options.reason.clone(),
            },
        )
        .await?;

        let entry = MemberAuditEntry::new(
            member.organization_id,
            member_id,
            AuditAction::Removed,
            actor_id,
            options.reason.clone(),
            json!({
                "previous_role": member.role.as_str(),
                "previous_status": member.status.as_str(),
                "new_role": MemberRole::InactiveMember.as_str(),
                "new_status": MemberStatus::Removed.as_str(),
                "transfer_to": options.transfer_to,
                "suspend_listings": options.suspend_listings,
                "affected_listings": affected_listings + late_listings.actions.len(),
            }),
        );
        tx.append_member_audit(&entry).await?;

        let organization_name = organization_name(tx.as_mut(), member.organization_id).await?;
        tx.commit().await?;

        AuditLogger::log_member_audit(&entry);

        Ok(RemovedMember {
            member,
            organization_name,
            removal_date,
            late_listings,
        })
    }

    async fn notify_removal(
        &self,
        removed: &RemovedMember,
        actor_id: Uuid,
        options: &RemovalOptions,
    ) -> NotificationOutcome {
        let payload = MemberRemovalNotification {
            member_id: removed.member.id,
            email: removed.member.email.clone(),
            display_name: removed.member.display_name.clone(),
            organization_id: removed.member.organization_id,
            organization_name: removed.organization_name.clone(),
            removed_by: actor_id,
            reason: options.reason.clone(),
            removal_date: removed.removal_date,
        };

        match self.notifier.send_member_removal_notification(&payload).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                NOTIFICATION_FAILURES_TOTAL
                    .with_label_values(&["removal"])
                    .inc();
                tracing::warn!(
                    member_id = %removed.member.id,
                    error = %e,
                    "Removal notification failed"
                );
                NotificationOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    // ========================================================================
    // Reactivation
    // ========================================================================

    /// Reactivate a removed member.
    ///
    /// Only members whose status is `removed` qualify; reactivating an active
    /// member is rejected rather than treated as a no-op.
    pub async fn reactivate_member(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: ReactivationOptions,
    ) -> AppResult<ReactivationResult> {
        let result = self.run_reactivation(member_id, actor_id, options).await;
        MEMBER_REACTIVATIONS_TOTAL
            .with_label_values(&[outcome_label(&result)])
            .inc();
        result
    }

    async fn run_reactivation(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: ReactivationOptions,
    ) -> AppResult<ReactivationResult> {
        if let Some(role) = options.new_role.filter(|r| !r.is_assignable()) {
            return Err(AppError::validation(format!(
                "newRole must be member or admin, got {}",
                role
            )));
        }

        let reactivated = self
            .commit_reactivation(member_id, actor_id, &options)
            .await?;

        let propagation = if reactivated.restored_listings.is_empty() {
            PropagationReport::default()
        } else {
            self.resolver
                .restore_conversation_ownership(member_id, &reactivated.restored_listings, actor_id)
                .await
        };

        tracing::info!(
            member_id = %member_id,
            actor_id = %actor_id,
            role = %reactivated.role,
            restored_listings = reactivated.restored_listings.len(),
            conversation_updates = propagation.updates.len(),
            propagation_failures = propagation.failures.len(),
            "Member reactivated"
        );

        let notification = self.notify_reactivation(&reactivated, actor_id).await;

        Ok(ReactivationResult {
            member_id,
            role: reactivated.role,
            restored_listings: reactivated.restored_listings,
            conversation_updates: propagation.updates,
            propagation_failures: propagation.failures,
            notification,
        })
    }

    async fn commit_reactivation(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        options: &ReactivationOptions,
    ) -> AppResult<ReactivatedMember> {
        let mut tx = self.store.begin().await?;

        let member = tx
            .lock_member(member_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("member {}", member_id)))?;
        let actor = permissions::require_actor(tx.get_member(actor_id).await?)?;
        permissions::ensure_can_manage(&actor, &member)?;

        if member.status != MemberStatus::Removed {
            return Err(StateConflict::NotRemoved {
                member_id,
                status: member.status.to_string(),
            }
            .into());
        }

        let (role, role_source) = match options.new_role {
            Some(role) => (role, "explicit"),
            None => {
                let previous = tx
                    .latest_member_audit(member_id, AuditAction::Removed)
                    .await?
                    .and_then(|entry| entry.previous_role());
                (restored_role(previous), "restored")
            }
        };

        let reactivated_at = Utc::now();
        tx.update_member_status(
            member_id,
            &MemberStatusPatch::Reactivated {
                role,
                reactivated_by: actor_id,
                reactivated_at,
            },
        )
        .await?;

        let mut restored_listings = Vec::new();
        if options.restore_listings {
            for listing in tx.get_restorable_listings(member_id).await? {
                if listing.status != ListingStatus::Active {
                    tx.set_listing_status(listing.id, ListingStatus::Active)
                        .await?;
                }
                if listing.current_owner_id != member_id
                    || listing.current_owner_type != OwnerType::Member
                {
                    tx.set_listing_owner(listing.id, member_id, OwnerType::Member)
                        .await?;
                }
                restored_listings.push(listing.id);
            }
        }

        let entry = MemberAuditEntry::new(
            member.organization_id,
            member_id,
            AuditAction::Reactivated,
            actor_id,
            None,
            json!({
                "previous_role": member.role.as_str(),
                "previous_status": member.status.as_str(),
                "new_role": role.as_str(),
                "new_status": MemberStatus::Active.as_str(),
                "role_source": role_source,
                "restore_listings": options.restore_listings,
                "restored_listings": restored_listings.len(),
            }),
        );
        tx.append_member_audit(&entry).await?;

        let organization_name = organization_name(tx.as_mut(), member.organization_id).await?;
        tx.commit().await?;

        AuditLogger::log_member_audit(&entry);

        Ok(ReactivatedMember {
            member,
            role,
            restored_listings,
            organization_name,
            reactivated_at,
        })
    }

    async fn notify_reactivation(
        &self,
        reactivated: &ReactivatedMember,
        actor_id: Uuid,
    ) -> NotificationOutcome {
        let payload = MemberReactivationNotification {
            member_id: reactivated.member.id,
            email: reactivated.member.email.clone(),
            display_name: reactivated.member.display_name.clone(),
            organization_id: reactivated.member.organization_id,
            organization_name: reactivated.organization_name.clone(),
            reactivated_by: actor_id,
            role: reactivated.role,
            reactivated_at: reactivated.reactivated_at,
            restored_listings: reactivated.restored_listings.len(),
        };

        match self
            .notifier
            .send_member_reactivation_notification(&payload)
            .await
        {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                NOTIFICATION_FAILURES_TOTAL
                    .with_label_values(&["reactivation"])
                    .inc();
                tracing::warn!(
                    member_id = %reactivated.member.id,
                    error = %e,
                    "Reactivation notification failed"
                );
                NotificationOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    // ========================================================================
    // Role changes
    // ========================================================================

    /// Change the role of an active, non-owner member
    pub async fn change_member_role(
        &self,
        member_id: Uuid,
        actor_id: Uuid,
        new_role: MemberRole,
    ) -> AppResult<RoleChangeResult> {
        if !new_role.is_assignable() {
            return Err(AppError::validation(format!(
                "role must be member or admin, got {}",
                new_role
            )));
        }

        let mut tx = self.store.begin().await?;

        let member = tx
            .lock_member(member_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("member {}", member_id)))?;
        let actor = permissions::require_actor(tx.get_member(actor_id).await?)?;
        permissions::ensure_can_manage(&actor, &member)?;

        if !member.is_active() {
            return Err(StateConflict::MemberNotActive {
                member_id,
                status: member.status.to_string(),
            }
            .into());
        }
        if member.role == new_role {
            return Err(StateConflict::RoleUnchanged {
                member_id,
                role: new_role.to_string(),
            }
            .into());
        }

        tx.update_member_status(member_id, &MemberStatusPatch::RoleChanged { role: new_role })
            .await?;

        let entry = MemberAuditEntry::new(
            member.organization_id,
            member_id,
            AuditAction::RoleChanged,
            actor_id,
            None,
            json!({
                "previous_role": member.role.as_str(),
                "new_role": new_role.as_str(),
            }),
        );
        tx.append_member_audit(&entry).await?;
        tx.commit().await?;

        AuditLogger::log_member_audit(&entry);

        Ok(RoleChangeResult {
            member_id,
            previous_role: member.role,
            role: new_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restored_role_maps_inactive_to_member() {
        assert_eq!(restored_role(Some(MemberRole::Admin)), MemberRole::Admin);
        assert_eq!(restored_role(Some(MemberRole::Member)), MemberRole::Member);
        assert_eq!(
            restored_role(Some(MemberRole::InactiveMember)),
            MemberRole::Member
        );
        assert_eq!(restored_role(None), MemberRole::Member);
    }

    #[test]
    fn test_reason_length_is_counted_in_characters() {
        assert!(validate_reason(None).is_ok());
        assert!(validate_reason(Some(&"ü".repeat(MAX_REASON_LENGTH))).is_ok());
        assert!(validate_reason(Some(&"a".repeat(MAX_REASON_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_outcome_labels() {
        let ok: AppResult<()> = Ok(());
        let rejected: AppResult<()> = Err(AppError::validation("x"));
        let failed: AppResult<()> = Err(AppError::transient("x"));
        assert_eq!(outcome_label(&ok), "completed");
        assert_eq!(outcome_label(&rejected), "rejected");
        assert_eq!(outcome_label(&failed), "failed");
    }
}
