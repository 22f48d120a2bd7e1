// Explicit listing transfer between active members of one organization.

use uuid::Uuid;

use marketplace_error::{AppError, AppResult, StateConflict};
use marketplace_types::{OwnerType, OwnershipChangeReason};

use super::{ListingTransferResult, MemberLifecycleCoordinator, permissions};
use crate::audit::AuditLogger;
use crate::routing::PropagationReport;
use crate::store::{ListingOwnershipStore, MemberLifecycleStore, StoreTransaction};

impl MemberLifecycleCoordinator {
    /// Hand an active listing to another active member.
    ///
    /// Allowed for the listing's current owner and for owners/admins of the
    /// listing's organization.
    pub async fn transfer_listing(
        &self,
        listing_id: Uuid,
        actor_id: Uuid,
        new_owner_id: Uuid,
    ) -> AppResult<ListingTransferResult> {
        let mut tx = self.store.begin().await?;

        let listing = tx
            .lock_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("listing {}", listing_id)))?;
        let actor = permissions::require_actor(tx.get_member(actor_id).await?)?;

        let is_current_owner = actor.is_active()
            && listing.current_owner_id == actor.id
            && listing.current_owner_type == OwnerType::Member;
        if !is_current_owner {
            let organization_id = listing.organization_id.ok_or_else(|| {
                AppError::permission_denied("only the owner can transfer this listing")
            })?;
            permissions::ensure_org_manager(&actor, organization_id)?;
        }

        if !listing.is_active() {
            return Err(StateConflict::ListingNotActive {
                listing_id,
                status: listing.status.to_string(),
            }
            .into());
        }

        // Serializes with a concurrent removal of the target
        let eligible = tx.lock_member(new_owner_id).await?.is_some_and(|m| {
            m.is_active()
                && match listing.organization_id {
                    Some(org) => m.belongs_to(org),
                    None => true,
                }
        });
        if !eligible {
            return Err(StateConflict::InvalidTransferTarget(format!(
                "{} is not an active member of the listing's organization",
                new_owner_id
            ))
            .into());
        }
        if listing.current_owner_id == new_owner_id
            && listing.current_owner_type == OwnerType::Member
        {
            return Err(StateConflict::InvalidTransferTarget(format!(
                "{} already owns listing {}",
                new_owner_id, listing_id
            ))
            .into());
        }

        tx.set_listing_owner(listing_id, new_owner_id, OwnerType::Member)
            .await?;
        tx.commit().await?;

        AuditLogger::log_listing_transfer(
            actor_id,
            listing_id,
            listing.organization_id,
            listing.current_owner_id,
            new_owner_id,
        );

        let propagation = match self
            .resolver
            .update_conversation_ownership(
                listing_id,
                new_owner_id,
                OwnershipChangeReason::ListingTransferred,
                Some(actor_id),
            )
            .await
        {
            Ok(report) => report,
            Err(e) => {
                let mut report = PropagationReport::default();
                report.listing_failed(listing_id, &e);
                report
            }
        };

        tracing::info!(
            listing_id = %listing_id,
            previous_owner_id = %listing.current_owner_id,
            new_owner_id = %new_owner_id,
            conversation_updates = propagation.updates.len(),
            "Listing transferred"
        );

        Ok(ListingTransferResult {
            listing_id,
            previous_owner_id: listing.current_owner_id,
            new_owner_id,
            conversation_updates: propagation.updates,
            propagation_failures: propagation.failures,
        })
    }
}
