/// Membership ledger: the member mutation rules and operations
///
/// All member mutations (role changes, removals) flow through a single pure
/// decision function so the rule set lives in exactly one place. There are
/// two fixed gates and nothing else:
///
/// 1. the actor must hold OWNER or ADMIN in the workspace;
/// 2. the target's current role is then checked: OWNER targets are immutable,
///    and ADMIN actors cannot touch ADMIN targets.
///
/// There is deliberately no numeric rank scale. GUEST and MEMBER are never
/// ordered against each other; adding a "level" comparison here would invent
/// authority relationships the product doesn't have.
///
/// Invites share gate 1 and add workspace-type rules: only professional
/// workspaces accept members, and the invited role can never be OWNER
/// (enforced at the type level by [`AssignableRole`]).

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::membership::{
    AssignableRole, CreateMembership, MemberRole, Membership, MembershipWithUser,
};
use crate::models::user::User;
use crate::models::workspace::{Workspace, WorkspaceType};

/// Outcome of the two-gate mutation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationDecision {
    /// Both gates passed; the mutation may proceed
    Permit,

    /// Gate 1 failed: the actor is MEMBER or GUEST
    Forbidden,

    /// Gate 2 failed: the target is the OWNER
    ImmutableOwner,

    /// Gate 2 failed: ADMIN acting on ADMIN
    InsufficientRank,
}

impl MutationDecision {
    /// Converts the decision into a result for the operation pipeline
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            MutationDecision::Permit => Ok(()),
            MutationDecision::Forbidden => Err(DomainError::Forbidden),
            MutationDecision::ImmutableOwner => Err(DomainError::ImmutableOwner),
            MutationDecision::InsufficientRank => Err(DomainError::InsufficientRank),
        }
    }
}

/// Decides whether `actor` may mutate (re-role or remove) a membership whose
/// current role is `target`
///
/// Pure and total over the role matrix; the truth table is pinned by the unit
/// tests below.
pub fn mutation_decision(actor: MemberRole, target: MemberRole) -> MutationDecision {
    if !actor.can_manage_members() {
        return MutationDecision::Forbidden;
    }
    if target == MemberRole::Owner {
        return MutationDecision::ImmutableOwner;
    }
    if actor == MemberRole::Admin && target == MemberRole::Admin {
        return MutationDecision::InsufficientRank;
    }
    MutationDecision::Permit
}

/// Lists the members of a workspace with their user profiles
///
/// Any member may list, regardless of role; non-members get `Forbidden`.
/// Ordering is OWNER first, then ADMIN, MEMBER, GUEST.
pub async fn list_members(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
) -> Result<Vec<MembershipWithUser>, DomainError> {
    if !Membership::has_access(pool, workspace_id, actor_id).await? {
        return Err(DomainError::Forbidden);
    }

    let members = Membership::list_with_users(pool, workspace_id).await?;
    Ok(members)
}

/// Invites a user by email into a professional workspace
///
/// If no user exists for the email, an unlinked placeholder row is created in
/// the same transaction as the membership, so a failed insert leaves no
/// orphan user behind. Races on the membership unique constraint surface as
/// `AlreadyMember`.
pub async fn invite_member(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
    email: &str,
    role: AssignableRole,
) -> Result<Membership, DomainError> {
    let actor_role = Membership::get_role(pool, workspace_id, actor_id)
        .await?
        .ok_or(DomainError::Forbidden)?;
    if !actor_role.can_manage_members() {
        return Err(DomainError::Forbidden);
    }

    let workspace = Workspace::find_by_id(pool, workspace_id)
        .await?
        .ok_or(DomainError::WorkspaceNotFound)?;
    if workspace.kind != WorkspaceType::Professional {
        return Err(DomainError::InvalidWorkspaceType);
    }

    let mut tx = pool.begin().await?;

    let invitee = match User::find_by_email(pool, email).await? {
        Some(user) => user,
        None => User::create_placeholder(&mut *tx, email).await?,
    };

    if Membership::find(pool, workspace_id, invitee.id).await?.is_some() {
        return Err(DomainError::AlreadyMember);
    }

    let membership = Membership::create(
        &mut *tx,
        CreateMembership {
            workspace_id,
            user_id: invitee.id,
            role: role.as_role(),
        },
    )
    .await
    .map_err(DomainError::from_membership_insert)?;

    tx.commit().await?;

    info!(
        workspace_id = %workspace_id,
        user_id = %invitee.id,
        role = role.as_role().as_str(),
        "member invited"
    );

    Ok(membership)
}

/// Changes a member's role
///
/// The decision function runs against the target's *current* role, read
/// fresh from storage; stale client beliefs about the target don't matter.
pub async fn update_member_role(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
    membership_id: Uuid,
    new_role: AssignableRole,
) -> Result<Membership, DomainError> {
    let actor_role = Membership::get_role(pool, workspace_id, actor_id)
        .await?
        .ok_or(DomainError::Forbidden)?;
    if !actor_role.can_manage_members() {
        return Err(DomainError::Forbidden);
    }

    let target = Membership::find_in_workspace(pool, workspace_id, membership_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    mutation_decision(actor_role, target.role).into_result()?;

    let updated = Membership::update_role(pool, membership_id, new_role.as_role())
        .await?
        .ok_or(DomainError::NotFound)?;

    info!(
        workspace_id = %workspace_id,
        membership_id = %membership_id,
        role = new_role.as_role().as_str(),
        "member role updated"
    );

    Ok(updated)
}

/// Removes a member from a workspace
///
/// Same gates as a role change: the removal of the OWNER is impossible, and
/// ADMINs cannot remove other ADMINs.
pub async fn remove_member(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
    membership_id: Uuid,
) -> Result<(), DomainError> {
    let actor_role = Membership::get_role(pool, workspace_id, actor_id)
        .await?
        .ok_or(DomainError::Forbidden)?;
    if !actor_role.can_manage_members() {
        return Err(DomainError::Forbidden);
    }

    let target = Membership::find_in_workspace(pool, workspace_id, membership_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    mutation_decision(actor_role, target.role).into_result()?;

    if !Membership::delete(pool, membership_id).await? {
        return Err(DomainError::NotFound);
    }

    info!(
        workspace_id = %workspace_id,
        membership_id = %membership_id,
        "member removed"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [MemberRole; 4] = [
        MemberRole::Owner,
        MemberRole::Admin,
        MemberRole::Member,
        MemberRole::Guest,
    ];

    #[test]
    fn test_member_and_guest_actors_always_forbidden() {
        for actor in [MemberRole::Member, MemberRole::Guest] {
            for target in ALL_ROLES {
                assert_eq!(
                    mutation_decision(actor, target),
                    MutationDecision::Forbidden,
                    "{actor:?} acting on {target:?}"
                );
            }
        }
    }

    #[test]
    fn test_owner_target_is_immutable_for_everyone() {
        for actor in [MemberRole::Owner, MemberRole::Admin] {
            assert_eq!(
                mutation_decision(actor, MemberRole::Owner),
                MutationDecision::ImmutableOwner
            );
        }
    }

    #[test]
    fn test_admin_cannot_touch_admin() {
        assert_eq!(
            mutation_decision(MemberRole::Admin, MemberRole::Admin),
            MutationDecision::InsufficientRank
        );
    }

    #[test]
    fn test_owner_can_mutate_everyone_but_owner() {
        for target in [MemberRole::Admin, MemberRole::Member, MemberRole::Guest] {
            assert_eq!(
                mutation_decision(MemberRole::Owner, target),
                MutationDecision::Permit
            );
        }
    }

    #[test]
    fn test_admin_can_mutate_member_and_guest() {
        for target in [MemberRole::Member, MemberRole::Guest] {
            assert_eq!(
                mutation_decision(MemberRole::Admin, target),
                MutationDecision::Permit
            );
        }
    }

    #[test]
    fn test_decision_into_result() {
        assert!(MutationDecision::Permit.into_result().is_ok());
        assert!(matches!(
            MutationDecision::Forbidden.into_result(),
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            MutationDecision::ImmutableOwner.into_result(),
            Err(DomainError::ImmutableOwner)
        ));
        assert!(matches!(
            MutationDecision::InsufficientRank.into_result(),
            Err(DomainError::InsufficientRank)
        ));
    }

    // Database-backed invite/update/remove flows are covered by the
    // integration tests in taskhive-api/tests/.
}
