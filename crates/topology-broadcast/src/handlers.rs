//! Plain HTTP handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is serving.
    pub status: &'static str,
    /// Registered viewer connections.
    pub connections: usize,
    /// Seconds since startup.
    pub uptime_seconds: u64,
}

/// Liveness check with the current connection count.
///
/// # Route
///
/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.registry.len().await,
        uptime_seconds: state.uptime_seconds(),
    })
}
