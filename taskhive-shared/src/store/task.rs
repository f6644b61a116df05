/// Task operations: creation, listing, partial updates, the `"personal"` alias
///
/// Tasks are strictly user-scoped; every operation takes the actor's user id
/// and another user's task behaves as if it doesn't exist. The `"personal"`
/// workspace alias resolves to a per-user workspace that is auto-provisioned
/// on first use with a deterministic id, so retried first requests land on
/// the same workspace instead of creating duplicates.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::membership::{CreateMembership, MemberRole, Membership};
use crate::models::tag::Tag;
use crate::models::task::{CreateTask, Task, TaskFilter, TaskPatch, TaskPriority};
use crate::models::workspace::{CreateWorkspace, Workspace, WorkspaceType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The workspace alias accepted wherever a workspace id is expected
pub const PERSONAL_ALIAS: &str = "personal";

/// Fixed namespace for deriving personal workspace ids (UUIDv5)
///
/// Changing this value would orphan every auto-provisioned personal
/// workspace, so it is frozen.
const PERSONAL_WORKSPACE_NAMESPACE: Uuid = Uuid::from_u128(0x8f7a2c41_5d0e_4b7a_9c33_6e1f0a2b4d58);

/// A workspace reference as supplied by clients: an explicit id or the alias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceSelector {
    /// The `"personal"` alias
    Personal,

    /// An explicit workspace id
    Id(Uuid),
}

impl WorkspaceSelector {
    /// Parses a client-supplied workspace reference
    ///
    /// Anything that is neither the alias nor a UUID is a validation failure,
    /// signalled as `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == PERSONAL_ALIAS {
            return Some(WorkspaceSelector::Personal);
        }
        Uuid::parse_str(raw).ok().map(WorkspaceSelector::Id)
    }
}

/// Derives the deterministic personal workspace id for a user
///
/// UUIDv5 of the user id under a fixed namespace: stable across retries and
/// processes, distinct across users.
pub fn personal_workspace_id(user_id: Uuid) -> Uuid {
    Uuid::new_v5(&PERSONAL_WORKSPACE_NAMESPACE, user_id.as_bytes())
}

/// A task together with its attached tags, the shape handlers return
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithTags {
    #[serde(flatten)]
    pub task: Task,
    pub tags: Vec<Tag>,
}

/// Input for creating a task through the store
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub workspace: WorkspaceSelector,
    pub tag_ids: Vec<Uuid>,
}

/// Resolves a workspace selector for the actor
///
/// Explicit ids must reference an existing workspace (`WorkspaceNotFound`
/// otherwise). The alias resolves to the actor's personal workspace,
/// provisioning it on first use: the lookup by (owner, type) comes first so a
/// personal workspace created explicitly is reused rather than duplicated.
pub async fn resolve_workspace(
    pool: &PgPool,
    actor_id: Uuid,
    selector: WorkspaceSelector,
) -> Result<Uuid, DomainError> {
    match selector {
        WorkspaceSelector::Id(id) => {
            Workspace::find_by_id(pool, id)
                .await?
                .ok_or(DomainError::WorkspaceNotFound)?;
            Ok(id)
        }
        WorkspaceSelector::Personal => {
            if let Some(existing) =
                Workspace::find_by_owner_and_type(pool, actor_id, WorkspaceType::Personal).await?
            {
                return Ok(existing.id);
            }
            provision_personal_workspace(pool, actor_id).await
        }
    }
}

/// Creates the actor's personal workspace with its deterministic id
///
/// Atomic with the OWNER membership. A concurrent provisioning attempt for
/// the same user collides on the primary key or the (owner_id, type) index;
/// that loser re-reads and uses the winner's row.
async fn provision_personal_workspace(pool: &PgPool, actor_id: Uuid) -> Result<Uuid, DomainError> {
    let id = personal_workspace_id(actor_id);

    let mut tx = pool.begin().await?;

    let inserted = Workspace::create(
        &mut *tx,
        id,
        actor_id,
        CreateWorkspace {
            name: "Personal".to_string(),
            description: None,
            kind: WorkspaceType::Personal,
            image_url: None,
            company_name: None,
            company_size: None,
            company_domain: None,
        },
        None,
    )
    .await;

    match inserted {
        Ok(workspace) => {
            Membership::create(
                &mut *tx,
                CreateMembership {
                    workspace_id: workspace.id,
                    user_id: actor_id,
                    role: MemberRole::Owner,
                },
            )
            .await?;
            tx.commit().await?;

            info!(workspace_id = %workspace.id, owner_id = %actor_id, "personal workspace provisioned");
            Ok(workspace.id)
        }
        Err(err) => {
            let is_unique = matches!(
                &err,
                sqlx::Error::Database(db_err) if db_err.is_unique_violation()
            );
            if !is_unique {
                return Err(err.into());
            }
            tx.rollback().await?;

            Workspace::find_by_owner_and_type(pool, actor_id, WorkspaceType::Personal)
                .await?
                .map(|w| w.id)
                .ok_or(DomainError::WorkspaceNotFound)
        }
    }
}

/// Creates a task for the actor
///
/// Unknown tag ids are silently dropped; the insert joins against `tags` so
/// only real tags attach.
pub async fn create(pool: &PgPool, actor_id: Uuid, data: NewTask) -> Result<TaskWithTags, DomainError> {
    let workspace_id = resolve_workspace(pool, actor_id, data.workspace).await?;

    let mut tx = pool.begin().await?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            title: data.title,
            description: data.description,
            priority: data.priority,
            due_date: data.due_date,
            user_id: actor_id,
            workspace_id,
        },
    )
    .await?;

    Task::attach_tags(&mut *tx, task.id, &data.tag_ids).await?;

    tx.commit().await?;

    info!(task_id = %task.id, workspace_id = %workspace_id, "task created");

    let tags = Task::list_tags(pool, task.id).await?;
    Ok(TaskWithTags { task, tags })
}

/// Lists the actor's tasks, newest first, with tags attached
///
/// A `Personal` workspace filter resolves without provisioning: if the actor
/// has no personal workspace yet, there is nothing to list.
pub async fn list(
    pool: &PgPool,
    actor_id: Uuid,
    workspace: Option<WorkspaceSelector>,
    completed: Option<bool>,
) -> Result<Vec<TaskWithTags>, DomainError> {
    let workspace_id = match workspace {
        Some(WorkspaceSelector::Id(id)) => Some(id),
        Some(WorkspaceSelector::Personal) => {
            match Workspace::find_by_owner_and_type(pool, actor_id, WorkspaceType::Personal).await? {
                Some(w) => Some(w.id),
                None => return Ok(Vec::new()),
            }
        }
        None => None,
    };

    let tasks = Task::list_owned(
        pool,
        actor_id,
        TaskFilter {
            workspace_id,
            completed,
        },
    )
    .await?;

    with_tags(pool, tasks).await
}

/// Fetches one owned task with its tags
pub async fn get(pool: &PgPool, actor_id: Uuid, task_id: Uuid) -> Result<TaskWithTags, DomainError> {
    let task = Task::find_owned(pool, task_id, actor_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let tags = Task::list_tags(pool, task.id).await?;
    Ok(TaskWithTags { task, tags })
}

/// Applies a partial update to an owned task
///
/// `tag_ids: Some(_)` replaces the full tag set (an empty vec detaches
/// everything); `None` leaves tags untouched.
pub async fn update(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
    patch: TaskPatch,
    tag_ids: Option<Vec<Uuid>>,
) -> Result<TaskWithTags, DomainError> {
    // Ownership check up front so a foreign task 404s before any write
    Task::find_owned(pool, task_id, actor_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let mut tx = pool.begin().await?;

    let task = Task::update_owned(&mut *tx, task_id, actor_id, patch)
        .await?
        .ok_or(DomainError::NotFound)?;

    if let Some(tag_ids) = tag_ids {
        Task::clear_tags(&mut *tx, task_id).await?;
        Task::attach_tags(&mut *tx, task_id, &tag_ids).await?;
    }

    tx.commit().await?;

    let tags = Task::list_tags(pool, task.id).await?;
    Ok(TaskWithTags { task, tags })
}

/// Flips the completion flag on an owned task
pub async fn toggle_status(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
) -> Result<TaskWithTags, DomainError> {
    let task = Task::toggle_completed(pool, task_id, actor_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let tags = Task::list_tags(pool, task.id).await?;
    Ok(TaskWithTags { task, tags })
}

/// Deletes an owned task; its task_tags rows go with it, nothing else does
pub async fn delete(pool: &PgPool, actor_id: Uuid, task_id: Uuid) -> Result<(), DomainError> {
    if !Task::delete_owned(pool, task_id, actor_id).await? {
        return Err(DomainError::NotFound);
    }

    info!(task_id = %task_id, "task deleted");

    Ok(())
}

/// Loads tags for a batch of tasks
async fn with_tags(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskWithTags>, DomainError> {
    let mut out = Vec::with_capacity(tasks.len());
    for task in tasks {
        let tags = Task::list_tags(pool, task.id).await?;
        out.push(TaskWithTags { task, tags });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_id_is_deterministic() {
        let user = Uuid::new_v4();
        assert_eq!(personal_workspace_id(user), personal_workspace_id(user));
    }

    #[test]
    fn test_personal_id_is_distinct_across_users() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(personal_workspace_id(a), personal_workspace_id(b));
    }

    #[test]
    fn test_personal_id_is_not_the_user_id() {
        let user = Uuid::new_v4();
        assert_ne!(personal_workspace_id(user), user);
    }

    #[test]
    fn test_selector_parses_alias() {
        assert_eq!(
            WorkspaceSelector::parse("personal"),
            Some(WorkspaceSelector::Personal)
        );
    }

    #[test]
    fn test_selector_parses_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(
            WorkspaceSelector::parse(&id.to_string()),
            Some(WorkspaceSelector::Id(id))
        );
    }

    #[test]
    fn test_selector_rejects_garbage() {
        assert_eq!(WorkspaceSelector::parse("Personal"), None);
        assert_eq!(WorkspaceSelector::parse("not-a-uuid"), None);
        assert_eq!(WorkspaceSelector::parse(""), None);
    }
}
