/// User route handlers
///
/// # Endpoints
///
/// ```text
/// GET /v1/users/profile  # Fetch (and sync) the caller's profile
/// PUT /v1/users/:id      # Update a profile (self only)
/// ```
///
/// There is no signup endpoint: `GET /profile` is the canonical first touch
/// that materializes the local user row from the provider identity, linking
/// an invite placeholder by email when one exists.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskhive_shared::auth::identity::Identity;
use taskhive_shared::models::user::{UpdateUser, User};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_payload, require_user, resolve_user},
};

/// Request body for updating a user profile
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Username must be 1-255 characters"))]
    pub username: Option<String>,

    #[validate(length(max = 255, message = "First name too long"))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Last name too long"))]
    pub last_name: Option<String>,

    #[validate(length(max = 255, message = "Name too long"))]
    pub name: Option<String>,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    #[validate(length(max = 255, message = "Job title too long"))]
    pub job_title: Option<String>,
}

/// Fetches the caller's profile, creating or linking the local row
///
/// # Endpoint
///
/// ```text
/// GET /v1/users/profile
/// ```
pub async fn get_profile(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<User>> {
    let user = resolve_user(&state, &identity).await?;
    Ok(Json(user))
}

/// Updates a user profile
///
/// Callers can only update themselves; the path id must match the caller's
/// own user id.
///
/// # Endpoint
///
/// ```text
/// PUT /v1/users/:id
/// ```
///
/// # Errors
///
/// - 403 if the path id isn't the caller
/// - 422 if validation fails
pub async fn update_user(
    state: State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    check_payload(&req)?;

    let user = require_user(&state, &identity).await?;
    if user.id != user_id {
        return Err(ApiError::Forbidden(
            "Cannot update another user's profile".to_string(),
        ));
    }

    let updated = User::update(
        &state.db,
        user.id,
        UpdateUser {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            name: req.name,
            image_url: req.image_url,
            job_title: req.job_title,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(updated))
}
