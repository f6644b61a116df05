/// Task model and database operations
///
/// Tasks belong to the user who created them; workspace membership grants no
/// visibility into another user's tasks. The workspace id on a task is an
/// organizational pointer, and the only sharing boundary is the user id.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('no_priority', 'low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     priority task_priority NOT NULL DEFAULT 'no_priority',
///     due_date TIMESTAMPTZ,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_tags (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```
///
/// The `"personal"` alias resolution and tag attachment policies live in
/// `crate::store::task`; this module is the row-level CRUD.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::tag::Tag;

/// Task priority
///
/// `no_priority` is an explicit state, not an absent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    NoPriority,
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Converts priority to its storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::NoPriority => "no_priority",
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::NoPriority
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Completion flag, toggled via the status endpoint
    pub completed: bool,

    /// Owning user; the only visibility boundary
    pub user_id: Uuid,

    /// Workspace the task is filed under
    pub workspace_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub workspace_id: Uuid,
}

/// Partial update for a task
///
/// `None` leaves a field untouched. `due_date` needs the extra level because
/// "clear the due date" and "leave it alone" are different requests:
/// `Some(None)` clears, `Some(Some(_))` sets, `None` skips.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
}

/// Optional filters for task listing
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to a single workspace
    pub workspace_id: Option<Uuid>,

    /// Restrict by completion state
    pub completed: Option<bool>,
}

impl Task {
    /// Inserts a task row
    ///
    /// Accepts any executor so creation can share a transaction with tag
    /// attachment.
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, priority, due_date, user_id, workspace_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, priority, due_date, completed,
                      user_id, workspace_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.user_id)
        .bind(data.workspace_id)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// A task belonging to another user must behave as if it doesn't exist.
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, priority, due_date, completed,
                   user_id, workspace_id, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a user's tasks with optional filters, newest first
    pub async fn list_owned(
        pool: &PgPool,
        user_id: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = String::from(
            "SELECT id, title, description, priority, due_date, completed, \
             user_id, workspace_id, created_at, updated_at \
             FROM tasks WHERE user_id = $1",
        );
        let mut bind_count = 1;

        if filter.workspace_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND workspace_id = ${}", bind_count));
        }
        if filter.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND completed = ${}", bind_count));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Task>(&query).bind(user_id);

        if let Some(workspace_id) = filter.workspace_id {
            q = q.bind(workspace_id);
        }
        if let Some(completed) = filter.completed {
            q = q.bind(completed);
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Applies a partial update to an owned task
    ///
    /// # Returns
    ///
    /// The updated task if found and owned by `user_id`, None otherwise
    pub async fn update_owned<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if patch.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if patch.due_date.is_some() {
            bind_count += 1;
            // Binding Some(None) writes SQL NULL, which is the clear case
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if patch.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND user_id = $2 RETURNING id, title, description, priority, \
             due_date, completed, user_id, workspace_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(title) = patch.title {
            q = q.bind(title);
        }
        if let Some(description) = patch.description {
            q = q.bind(description);
        }
        if let Some(priority) = patch.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = patch.due_date {
            q = q.bind(due_date);
        }
        if let Some(completed) = patch.completed {
            q = q.bind(completed);
        }

        let task = q.fetch_optional(executor).await?;

        Ok(task)
    }

    /// Flips the completion flag on an owned task
    ///
    /// Toggling is idempotent in pairs: two toggles restore the original
    /// state.
    pub async fn toggle_completed(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET completed = NOT completed, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, description, priority, due_date, completed,
                      user_id, workspace_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes an owned task
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist or belongs to
    /// someone else
    pub async fn delete_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Attaches tags to a task, silently skipping ids that don't exist
    ///
    /// The join against `tags` is what drops unknown ids; callers never see
    /// an error for a bad tag id.
    pub async fn attach_tags<'e, E>(
        executor: E,
        task_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        if tag_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            SELECT $1, id FROM tags WHERE id = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(tag_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Detaches all tags from a task
    pub async fn clear_tags<'e, E>(executor: E, task_id: Uuid) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Lists the tags attached to a task
    pub async fn list_tags(pool: &PgPool, task_id: Uuid) -> Result<Vec<Tag>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM tags t
            JOIN task_tags tt ON tt.tag_id = t.id
            WHERE tt.task_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}
