// ABOUTME: API router configuration.
// ABOUTME: Wires routes to handlers and adds request tracing.

use super::handlers;
use super::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/deploy", post(handlers::deploy))
        .route("/config", get(handlers::get_config).put(handlers::put_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
