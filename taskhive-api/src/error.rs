/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Domain errors from the shared crate convert via `From<DomainError>`;
/// that mapping is the single place where the domain taxonomy meets HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskhive_shared::auth::identity::IdentityError;
use taskhive_shared::error::DomainError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert domain errors to API errors
///
/// Membership rule failures (ImmutableOwner, AlreadyMember, workspace type
/// conflicts) are client mistakes about the current state, so they map to
/// 400; role shortfalls map to 403; absence to 404.
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DomainError::WorkspaceNotFound => {
                ApiError::NotFound("Workspace not found".to_string())
            }
            DomainError::Forbidden => {
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            DomainError::InsufficientRank => {
                ApiError::Forbidden("Admins cannot modify other admins".to_string())
            }
            DomainError::ImmutableOwner => {
                ApiError::BadRequest("Cannot modify or remove the workspace owner".to_string())
            }
            DomainError::DuplicateWorkspaceType(kind) => ApiError::BadRequest(format!(
                "You already have a {} workspace",
                kind.as_str()
            )),
            DomainError::InvalidWorkspaceType => ApiError::BadRequest(
                "Members can only be added to professional workspaces".to_string(),
            ),
            DomainError::AlreadyMember => {
                ApiError::BadRequest("User is already a member of this workspace".to_string())
            }
            DomainError::Database(err) => err.into(),
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert identity token errors to API errors
impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhive_shared::models::workspace::WorkspaceType;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Workspace not found".to_string());
        assert_eq!(err.to_string(), "Not found: Workspace not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![ValidationErrorDetail {
            field: "email".to_string(),
            message: "Invalid email format".to_string(),
        }];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }

    #[test]
    fn test_domain_error_mapping() {
        assert!(matches!(
            ApiError::from(DomainError::ImmutableOwner),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(DomainError::InsufficientRank),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(DomainError::AlreadyMember),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(DomainError::WorkspaceNotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(DomainError::DuplicateWorkspaceType(WorkspaceType::Personal)),
            ApiError::BadRequest(_)
        ));
    }
}
