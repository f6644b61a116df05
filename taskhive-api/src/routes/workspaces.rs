/// Workspace route handlers
///
/// # Endpoints
///
/// ```text
/// POST   /v1/workspaces        # Create a workspace
/// GET    /v1/workspaces        # List the caller's workspaces
/// GET    /v1/workspaces/:id    # Fetch one workspace
/// PUT    /v1/workspaces/:id    # Update metadata (OWNER/ADMIN)
/// DELETE /v1/workspaces/:id    # Delete (owner only)
/// ```
///
/// Creation enforces the one-per-type rule: a second PERSONAL or second
/// PROFESSIONAL workspace for the same owner fails with 400.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskhive_shared::auth::identity::Identity;
use taskhive_shared::models::user::User;
use taskhive_shared::models::workspace::{CreateWorkspace, UpdateWorkspace, Workspace, WorkspaceType};
use taskhive_shared::store;

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{check_payload, require_user, resolve_user},
};

/// Request body for creating a workspace
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// PERSONAL or PROFESSIONAL
    #[serde(rename = "type")]
    pub kind: WorkspaceType,

    /// Optional logo/avatar URL
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    /// Company metadata for professional workspaces
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub company_domain: Option<String>,
}

/// Request body for updating workspace metadata
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Creates a workspace
///
/// The caller becomes OWNER. Professional workspaces get a 14-day trial
/// stamp. This is one of the endpoints allowed to lazily create the caller's
/// user row.
///
/// # Endpoint
///
/// ```text
/// POST /v1/workspaces
/// ```
///
/// # Errors
///
/// - 400 if the caller already owns a workspace of this type
/// - 422 if validation fails
pub async fn create_workspace(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    check_payload(&req)?;

    let user = resolve_user(&state, &identity).await?;

    let workspace = store::workspace::create(
        &state.db,
        user.id,
        CreateWorkspace {
            name: req.name,
            description: req.description,
            kind: req.kind,
            image_url: req.image_url,
            company_name: req.company_name,
            company_size: req.company_size,
            company_domain: req.company_domain,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// Lists all workspaces the caller is a member of, newest first
///
/// A caller whose user row doesn't exist yet simply has no workspaces.
///
/// # Endpoint
///
/// ```text
/// GET /v1/workspaces
/// ```
pub async fn list_workspaces(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<Workspace>>> {
    let user = match User::find_by_external_id(&state.db, &identity.subject).await? {
        Some(user) => user,
        None => return Ok(Json(Vec::new())),
    };

    let workspaces = store::workspace::list_for_user(&state.db, user.id).await?;
    Ok(Json(workspaces))
}

/// Fetches a single workspace the caller is a member of
///
/// # Endpoint
///
/// ```text
/// GET /v1/workspaces/:id
/// ```
///
/// # Errors
///
/// - 404 if the workspace doesn't exist or the caller isn't a member
pub async fn get_workspace(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Workspace>> {
    let user = require_user(&state, &identity).await?;

    let workspace = store::workspace::get(&state.db, workspace_id, user.id).await?;
    Ok(Json(workspace))
}

/// Updates workspace metadata
///
/// # Endpoint
///
/// ```text
/// PUT /v1/workspaces/:id
/// ```
///
/// # Errors
///
/// - 403 if the caller isn't OWNER or ADMIN
/// - 404 if the workspace doesn't exist
pub async fn update_workspace(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<UpdateWorkspaceRequest>,
) -> ApiResult<Json<Workspace>> {
    check_payload(&req)?;

    let user = require_user(&state, &identity).await?;

    let workspace = store::workspace::update(
        &state.db,
        workspace_id,
        user.id,
        UpdateWorkspace {
            name: req.name,
            description: req.description,
            image_url: req.image_url,
        },
    )
    .await?;

    Ok(Json(workspace))
}

/// Deletes a workspace
///
/// Owner only; ADMIN is not sufficient. Memberships and tasks cascade.
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/workspaces/:id
/// ```
///
/// # Errors
///
/// - 403 if the caller isn't the owner
/// - 404 if the workspace doesn't exist
pub async fn delete_workspace(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let user = require_user(&state, &identity).await?;

    store::workspace::delete(&state.db, workspace_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
