//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::gateway::ws_handler;
use crate::presentation::middleware::{auth_middleware, logging};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(logging::track_http_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/rooms", room_routes(state.clone()))
        .nest("/messages", message_routes(state))
}

/// Room routes (protected)
fn room_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::room::create_room))
        .route("/{room_id}", get(handlers::room::get_room))
        .route("/{room_id}/join", post(handlers::room::join_room))
        .route("/{room_id}/leave", post(handlers::room::leave_room))
        .route("/{room_id}/messages", get(handlers::message::list_messages))
        .route("/{room_id}/messages", post(handlers::message::send_message))
        .route("/{room_id}/moderation", post(handlers::moderation::apply_action))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Message-scoped routes (protected)
fn message_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{message_id}/reactions", post(handlers::reaction::add_reaction))
        .route(
            "/{message_id}/reactions/{emoji}",
            delete(handlers::reaction::remove_reaction),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
