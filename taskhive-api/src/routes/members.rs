/// Workspace membership route handlers
///
/// # Endpoints
///
/// ```text
/// GET    /v1/workspaces/:id/members             # List members
/// POST   /v1/workspaces/:id/members             # Invite by email
/// PUT    /v1/workspaces/:id/members/:member_id  # Change role
/// DELETE /v1/workspaces/:id/members/:member_id  # Remove member
/// ```
///
/// The mutation rules live in `taskhive_shared::ledger`; these handlers only
/// resolve the caller and translate payloads. `:member_id` is the membership
/// row id, not the user id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskhive_shared::auth::identity::Identity;
use taskhive_shared::ledger;
use taskhive_shared::models::membership::{AssignableRole, Membership, MembershipWithUser};

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{check_payload, require_user},
};

/// Request body for inviting a member
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberRequest {
    /// Email of the invitee; a placeholder user is created if none exists
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role to grant; defaults to MEMBER, can never be OWNER
    #[serde(default)]
    pub role: AssignableRole,
}

/// Request body for changing a member's role
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRoleRequest {
    /// New role; can never be OWNER
    pub role: AssignableRole,
}

/// Lists workspace members with their user profiles
///
/// OWNER first, then ADMIN, MEMBER, GUEST.
///
/// # Endpoint
///
/// ```text
/// GET /v1/workspaces/:id/members
/// ```
///
/// # Errors
///
/// - 404 if the workspace doesn't exist or the caller isn't a member
pub async fn list_members(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MembershipWithUser>>> {
    let user = require_user(&state, &identity).await?;

    let members = ledger::list_members(&state.db, workspace_id, user.id).await?;
    Ok(Json(members))
}

/// Invites a user into a professional workspace by email
///
/// # Endpoint
///
/// ```text
/// POST /v1/workspaces/:id/members
/// ```
///
/// # Errors
///
/// - 400 if the workspace is PERSONAL or the user is already a member
/// - 403 if the caller isn't OWNER or ADMIN
/// - 404 if the workspace doesn't exist
/// - 422 if the email fails validation
pub async fn invite_member(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<InviteMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    check_payload(&req)?;

    let user = require_user(&state, &identity).await?;

    let membership =
        ledger::invite_member(&state.db, workspace_id, user.id, &req.email, req.role).await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// Changes a member's role
///
/// # Endpoint
///
/// ```text
/// PUT /v1/workspaces/:id/members/:member_id
/// ```
///
/// # Errors
///
/// - 400 if the target is the OWNER
/// - 403 if the caller isn't OWNER or ADMIN, or an ADMIN targets an ADMIN
/// - 404 if the membership doesn't exist in this workspace
pub async fn update_member_role(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let user = require_user(&state, &identity).await?;

    let membership =
        ledger::update_member_role(&state.db, workspace_id, user.id, member_id, req.role).await?;

    Ok(Json(membership))
}

/// Removes a member from a workspace
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/workspaces/:id/members/:member_id
/// ```
///
/// # Errors
///
/// - 400 if the target is the OWNER
/// - 403 if the caller isn't OWNER or ADMIN, or an ADMIN targets an ADMIN
/// - 404 if the membership doesn't exist in this workspace
pub async fn remove_member(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let user = require_user(&state, &identity).await?;

    ledger::remove_member(&state.db, workspace_id, user.id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
