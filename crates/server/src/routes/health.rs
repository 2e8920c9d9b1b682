//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness check. Does not touch dependencies.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

/// API liveness check.
pub async fn api_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check.
///
/// Returns 503 Service Unavailable if the database is not reachable. Mock
/// mode is always ready.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
