//! Shared application state for the broadcast server.

use std::sync::Arc;

use tokio::time::Instant;

use crate::registry::ConnectionRegistry;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// registry is also held by the broadcast timers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every open viewer connection.
    pub registry: Arc<ConnectionRegistry>,
    started_at: Instant,
}

impl AppState {
    /// Create state with an empty registry whose connections queue at most
    /// `outbound_buffer` frames.
    pub fn new(outbound_buffer: usize) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(outbound_buffer)),
            started_at: Instant::now(),
        }
    }

    /// Whole seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
