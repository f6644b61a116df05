/// Tag route handlers
///
/// # Endpoints
///
/// ```text
/// GET  /v1/tags  # List all tags
/// POST /v1/tags  # Create a tag
/// ```
///
/// Tags are a flat global directory; any authenticated user can list and
/// create them. Attachment to tasks happens through the task endpoints.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use validator::Validate;

use taskhive_shared::auth::identity::Identity;
use taskhive_shared::models::tag::Tag;

use crate::{
    app::AppState,
    error::ApiResult,
    routes::check_payload,
};

/// Request body for creating a tag
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 100, message = "Tag name must be 1-100 characters"))]
    pub name: String,
}

/// Lists all tags, alphabetically
///
/// # Endpoint
///
/// ```text
/// GET /v1/tags
/// ```
pub async fn list_tags(
    state: State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<Json<Vec<Tag>>> {
    let tags = Tag::list(&state.db).await?;
    Ok(Json(tags))
}

/// Creates a tag
///
/// # Endpoint
///
/// ```text
/// POST /v1/tags
/// ```
///
/// # Errors
///
/// - 409 if the name is already taken
/// - 422 if validation fails
pub async fn create_tag(
    state: State<AppState>,
    Extension(_identity): Extension<Identity>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    check_payload(&req)?;

    let tag = Tag::create(&state.db, &req.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}
