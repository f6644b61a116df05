/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `workspaces`: Workspace CRUD
/// - `members`: Workspace membership (list, invite, role changes, removal)
/// - `tasks`: Task CRUD, status toggle, the `"personal"` alias
/// - `users`: Profile sync and profile updates
/// - `tags`: Tag directory

use axum::extract::State;
use taskhive_shared::auth::identity::Identity;
use taskhive_shared::models::user::User;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ValidationErrorDetail},
};

pub mod health;
pub mod members;
pub mod tags;
pub mod tasks;
pub mod users;
pub mod workspaces;

/// Runs validator checks on a request payload, mapping failures to 422
pub(crate) fn check_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| {
        let errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    })
}

/// Resolves the local user row for an identity, creating or linking it
///
/// Used by write paths: the first workspace or task creation is allowed to
/// bring the user row into existence.
pub(crate) async fn resolve_user(
    state: &State<AppState>,
    identity: &Identity,
) -> Result<User, ApiError> {
    let user = User::find_or_create_from_identity(&state.db, identity).await?;
    Ok(user)
}

/// Fetches the local user row for an identity, or 404 if it was never created
///
/// Used by read paths that should not create rows as a side effect.
pub(crate) async fn require_user(
    state: &State<AppState>,
    identity: &Identity,
) -> Result<User, ApiError> {
    User::find_by_external_id(&state.db, &identity.subject)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}
