// Actor checks for lifecycle operations. Identity comes from upstream
// authentication; role and organization are re-validated here against the
// stored member rows.

use marketplace_error::{AppError, AppResult};
use marketplace_types::{Member, MemberRole};
use uuid::Uuid;

/// Actor must be an active owner/admin of `organization_id`
pub fn ensure_org_manager(actor: &Member, organization_id: Uuid) -> AppResult<()> {
    if !actor.is_active() || !actor.belongs_to(organization_id) {
        return Err(AppError::permission_denied(
            "actor is not an active member of this organization",
        ));
    }
    if !actor.role.can_manage_members() {
        return Err(AppError::permission_denied(
            "only organization owners and admins can manage members",
        ));
    }
    Ok(())
}

/// Actor may change the lifecycle of `target`. Returns the shared
/// organization id.
pub fn ensure_can_manage(actor: &Member, target: &Member) -> AppResult<Uuid> {
    let organization_id = target
        .organization_id
        .ok_or_else(|| AppError::permission_denied("member does not belong to an organization"))?;

    ensure_org_manager(actor, organization_id)?;

    if actor.id == target.id {
        return Err(AppError::permission_denied(
            "members cannot change their own membership",
        ));
    }
    if target.role == MemberRole::Owner {
        return Err(AppError::permission_denied(
            "the organization owner cannot be removed or re-roled",
        ));
    }
    Ok(organization_id)
}

/// Load the actor row or reject
pub fn require_actor(actor: Option<Member>) -> AppResult<Member> {
    actor.ok_or_else(|| AppError::permission_denied("actor is not a member of any organization"))
}
