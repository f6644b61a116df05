/// Workspace operations: creation, reads, updates, deletion
///
/// A workspace is never valid without its OWNER membership, so creation runs
/// both inserts in one transaction. Everything here takes an explicit actor
/// id; nothing trusts the caller to have pre-checked roles.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::membership::{CreateMembership, MemberRole, Membership};
use crate::models::workspace::{CreateWorkspace, UpdateWorkspace, Workspace, WorkspaceType};

/// Trial length stamped onto professional workspaces at creation
pub const TRIAL_DAYS: i64 = 14;

/// Creates a workspace and its OWNER membership atomically
///
/// Each owner can hold at most one workspace per type; a duplicate fails with
/// `DuplicateWorkspaceType` before any write. The database's unique index on
/// (owner_id, type) backs the pre-check under concurrency. Professional
/// workspaces get a trial expiry stamp of creation + 14 days; the stamp is
/// advisory and nothing enforces it.
pub async fn create(
    pool: &PgPool,
    owner_id: Uuid,
    data: CreateWorkspace,
) -> Result<Workspace, DomainError> {
    if Workspace::find_by_owner_and_type(pool, owner_id, data.kind)
        .await?
        .is_some()
    {
        return Err(DomainError::DuplicateWorkspaceType(data.kind));
    }

    let subscription_ends_at = match data.kind {
        WorkspaceType::Professional => Some(Utc::now() + Duration::days(TRIAL_DAYS)),
        WorkspaceType::Personal => None,
    };

    let kind = data.kind;
    let mut tx = pool.begin().await?;

    let workspace = Workspace::create(
        &mut *tx,
        Uuid::new_v4(),
        owner_id,
        data,
        subscription_ends_at,
    )
    .await
    .map_err(|err| map_workspace_insert(err, kind))?;

    Membership::create(
        &mut *tx,
        CreateMembership {
            workspace_id: workspace.id,
            user_id: owner_id,
            role: MemberRole::Owner,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        workspace_id = %workspace.id,
        owner_id = %owner_id,
        kind = workspace.kind.as_str(),
        "workspace created"
    );

    Ok(workspace)
}

/// Lists all workspaces where the actor holds any membership, newest first
pub async fn list_for_user(pool: &PgPool, actor_id: Uuid) -> Result<Vec<Workspace>, DomainError> {
    let workspaces = Workspace::list_for_member(pool, actor_id).await?;
    Ok(workspaces)
}

/// Fetches a workspace the actor is a member of
///
/// Non-membership and absence are the same `NotFound`; the response must not
/// reveal whether the workspace exists.
pub async fn get(pool: &PgPool, workspace_id: Uuid, actor_id: Uuid) -> Result<Workspace, DomainError> {
    if !Membership::has_access(pool, workspace_id, actor_id).await? {
        return Err(DomainError::NotFound);
    }

    Workspace::find_by_id(pool, workspace_id)
        .await?
        .ok_or(DomainError::NotFound)
}

/// Updates workspace metadata; OWNER or ADMIN only
pub async fn update(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
    data: UpdateWorkspace,
) -> Result<Workspace, DomainError> {
    let role = Membership::get_role(pool, workspace_id, actor_id)
        .await?
        .ok_or(DomainError::Forbidden)?;
    if !role.can_manage_members() {
        return Err(DomainError::Forbidden);
    }

    Workspace::update(pool, workspace_id, data)
        .await?
        .ok_or(DomainError::NotFound)
}

/// Deletes a workspace; the owner only
///
/// ADMIN is not enough here. Deletion cascades to memberships and tasks
/// through the foreign keys.
pub async fn delete(pool: &PgPool, workspace_id: Uuid, actor_id: Uuid) -> Result<(), DomainError> {
    let workspace = Workspace::find_by_id(pool, workspace_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    if workspace.owner_id != actor_id {
        return Err(DomainError::Forbidden);
    }

    if !Workspace::delete(pool, workspace_id).await? {
        return Err(DomainError::NotFound);
    }

    info!(workspace_id = %workspace_id, "workspace deleted");

    Ok(())
}

/// Maps the (owner_id, type) unique violation to `DuplicateWorkspaceType`
///
/// The pre-check in `create` loses races; the constraint doesn't.
fn map_workspace_insert(err: sqlx::Error, kind: WorkspaceType) -> DomainError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return DomainError::DuplicateWorkspaceType(kind);
        }
    }
    DomainError::Database(err)
}
