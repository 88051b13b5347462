//! Axum router construction for the broadcast server.
//!
//! Assembles the `WebSocket` endpoint and the health check into a single
//! [`Router`] with CORS enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET {ws_path}` -- `WebSocket` broadcast stream
/// - `GET /health` -- liveness and connection count
pub fn build_router(state: Arc<AppState>, ws_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(ws_path, get(ws::ws_metrics))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
