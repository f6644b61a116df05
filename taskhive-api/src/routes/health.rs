/// Liveness endpoint
///
/// `GET /health` is the only unauthenticated route. It reports whether the
/// process is up and whether the database answers, so a load balancer can
/// tell "dead" from "up but degraded".

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskhive_shared::db::pool;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" when the database answers, "degraded" otherwise
    pub status: String,

    /// Crate version, for deploy verification
    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,
}

/// Reports process and database health
///
/// Never fails the request: a broken database yields a 200 with
/// `status: "degraded"` rather than an error, so the probe itself stays
/// distinguishable from a dead process.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_up = pool::health_check(&state.db).await.is_ok();

    Ok(Json(HealthResponse {
        status: if database_up { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_up { "connected" } else { "disconnected" }.to_string(),
    }))
}
