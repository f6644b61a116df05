/// Task route handlers
///
/// # Endpoints
///
/// ```text
/// POST   /v1/tasks             # Create a task
/// GET    /v1/tasks             # List the caller's tasks
/// GET    /v1/tasks/:id         # Fetch one task
/// PUT    /v1/tasks/:id         # Partial update
/// DELETE /v1/tasks/:id         # Delete
/// PATCH  /v1/tasks/:id/status  # Toggle completion
/// ```
///
/// Wherever a workspace id is accepted (`workspaceId` in bodies and query
/// strings), the literal string `"personal"` is also accepted and resolves to
/// the caller's personal workspace, creating it on first use.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use taskhive_shared::auth::identity::Identity;
use taskhive_shared::models::task::{TaskPatch, TaskPriority};
use taskhive_shared::store::task::{self, NewTask, TaskWithTags, WorkspaceSelector, PERSONAL_ALIAS};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::{check_payload, require_user, resolve_user},
};

/// Request body for creating a task
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Priority; defaults to no_priority
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Workspace id or the `"personal"` alias
    #[serde(default = "default_workspace")]
    pub workspace_id: String,

    /// Tags to attach; unknown ids are silently dropped
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

fn default_workspace() -> String {
    PERSONAL_ALIAS.to_string()
}

/// Request body for updating a task
///
/// Absent fields are left untouched. `dueDate` distinguishes absent from
/// explicit null: `"dueDate": null` clears the date, omitting it keeps it.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub completed: Option<bool>,

    /// Replaces the full tag set when present; an empty array detaches all
    pub tags: Option<Vec<Uuid>>,
}

/// Deserializes a field that must distinguish "absent" from "null"
///
/// serde collapses both to None by default; wrapping the parsed value in Some
/// here means absent stays None (via the field default) while null becomes
/// Some(None).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Query parameters for task listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    /// Restrict to one workspace (id or `"personal"`)
    pub workspace_id: Option<String>,

    /// Restrict by completion state
    pub completed: Option<bool>,
}

/// Parses a client-supplied workspace reference or fails with 422
fn parse_selector(raw: &str) -> Result<WorkspaceSelector, ApiError> {
    WorkspaceSelector::parse(raw).ok_or_else(|| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "workspaceId".to_string(),
            message: format!("Expected a workspace UUID or \"{}\"", PERSONAL_ALIAS),
        }])
    })
}

/// Creates a task for the caller
///
/// Defaults to the personal workspace, auto-provisioning it if needed. This
/// is one of the endpoints allowed to lazily create the caller's user row.
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks
/// ```
///
/// # Errors
///
/// - 404 if an explicit `workspaceId` references no workspace
/// - 422 if validation fails
pub async fn create_task(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskWithTags>)> {
    check_payload(&req)?;
    let selector = parse_selector(&req.workspace_id)?;

    let user = resolve_user(&state, &identity).await?;

    let task = task::create(
        &state.db,
        user.id,
        NewTask {
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            workspace: selector,
            tag_ids: req.tags,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Lists the caller's tasks, newest first
///
/// Only the caller's own tasks are visible, regardless of workspace
/// membership.
///
/// # Endpoint
///
/// ```text
/// GET /v1/tasks?workspaceId=...&completed=...
/// ```
pub async fn list_tasks(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskWithTags>>> {
    let selector = match &query.workspace_id {
        Some(raw) => Some(parse_selector(raw)?),
        None => None,
    };

    let user = require_user(&state, &identity).await?;

    let tasks = task::list(&state.db, user.id, selector, query.completed).await?;
    Ok(Json(tasks))
}

/// Fetches one of the caller's tasks
///
/// # Endpoint
///
/// ```text
/// GET /v1/tasks/:id
/// ```
///
/// # Errors
///
/// - 404 if the task doesn't exist or belongs to another user
pub async fn get_task(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskWithTags>> {
    let user = require_user(&state, &identity).await?;

    let task = task::get(&state.db, user.id, task_id).await?;
    Ok(Json(task))
}

/// Applies a partial update to one of the caller's tasks
///
/// # Endpoint
///
/// ```text
/// PUT /v1/tasks/:id
/// ```
///
/// # Errors
///
/// - 404 if the task doesn't exist or belongs to another user
/// - 422 if validation fails
pub async fn update_task(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskWithTags>> {
    check_payload(&req)?;

    let user = require_user(&state, &identity).await?;

    let task = task::update(
        &state.db,
        user.id,
        task_id,
        TaskPatch {
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            completed: req.completed,
        },
        req.tags,
    )
    .await?;

    Ok(Json(task))
}

/// Flips the completion flag on one of the caller's tasks
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/tasks/:id/status
/// ```
///
/// # Errors
///
/// - 404 if the task doesn't exist or belongs to another user
pub async fn toggle_task_status(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskWithTags>> {
    let user = require_user(&state, &identity).await?;

    let task = task::toggle_status(&state.db, user.id, task_id).await?;
    Ok(Json(task))
}

/// Deletes one of the caller's tasks
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/tasks/:id
/// ```
///
/// # Errors
///
/// - 404 if the task doesn't exist or belongs to another user
pub async fn delete_task(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let user = require_user(&state, &identity).await?;

    task::delete(&state.db, user.id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_absent_due_date_stays_unset() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(req.due_date, None);
    }

    #[test]
    fn test_update_request_null_due_date_clears() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(req.due_date, Some(None));
    }

    #[test]
    fn test_update_request_set_due_date() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"dueDate": "2026-01-15T12:00:00Z"}"#).unwrap();
        assert!(matches!(req.due_date, Some(Some(_))));
    }

    #[test]
    fn test_create_request_defaults_to_personal() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(req.workspace_id, PERSONAL_ALIAS);
        assert_eq!(req.priority, TaskPriority::NoPriority);
        assert!(req.tags.is_empty());
    }

    #[test]
    fn test_parse_selector_rejects_garbage() {
        assert!(parse_selector("nope").is_err());
        assert!(parse_selector("personal").is_ok());
    }
}
