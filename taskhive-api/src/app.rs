/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskhive_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::auth::identity::{self, Identity};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the shared secret for verifying identity tokens
    pub fn identity_secret(&self) -> &str {
        &self.config.identity.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  # Health check (public)
/// └── /v1/                                     # Authenticated API
///     ├── /workspaces                          # POST create, GET list
///     │   └── /:id                             # GET, PUT, DELETE
///     │       └── /members                     # GET list, POST invite
///     │           └── /:member_id              # PUT role, DELETE remove
///     ├── /tasks                               # POST create, GET list
///     │   └── /:id                             # GET, PUT, DELETE
///     │       └── /status                      # PATCH toggle
///     ├── /users/profile                       # GET (sync from identity)
///     ├── /users/:id                           # PUT (self only)
///     └── /tags                                # GET list, POST create
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Identity verification on everything under /v1
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let workspace_routes = Router::new()
        .route("/", post(routes::workspaces::create_workspace))
        .route("/", get(routes::workspaces::list_workspaces))
        .route("/:id", get(routes::workspaces::get_workspace))
        .route("/:id", put(routes::workspaces::update_workspace))
        .route("/:id", delete(routes::workspaces::delete_workspace))
        .route("/:id/members", get(routes::members::list_members))
        .route("/:id/members", post(routes::members::invite_member))
        .route(
            "/:id/members/:member_id",
            put(routes::members::update_member_role),
        )
        .route(
            "/:id/members/:member_id",
            delete(routes::members::remove_member),
        );

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/status", patch(routes::tasks::toggle_task_status));

    let user_routes = Router::new()
        .route("/profile", get(routes::users::get_profile))
        .route("/:id", put(routes::users::update_user));

    let tag_routes = Router::new()
        .route("/", get(routes::tags::list_tags))
        .route("/", post(routes::tags::create_tag));

    // Everything under /v1 requires a valid identity token
    let v1_routes = Router::new()
        .nest("/workspaces", workspace_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes)
        .nest("/tags", tag_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Identity verification middleware
///
/// Extracts and validates the provider-issued bearer token from the
/// Authorization header, then injects an [`Identity`] into request
/// extensions. Handlers resolve the local user row from it.
async fn identity_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = identity::validate_identity_token(token, state.identity_secret())?;

    req.extensions_mut().insert(Identity::from(claims));

    Ok(next.run(req).await)
}
