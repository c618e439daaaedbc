//! Health Check Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::startup::AppState;

/// Basic health check
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Liveness probe: the process is up and serving.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: storage is reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
