//! Broadcast server lifecycle.
//!
//! [`start_server`] binds the listener, spawns the Axum server and the
//! three broadcast timers, and hands back a [`RunningServer`]. Shutdown
//! runs in a fixed order: stop accepting, stop the timers, close every
//! socket, then wait for the listener task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use topology_graph::{GraphError, starting_topology};
use tracing::{error, info};

use crate::config::TopologyConfig;
use crate::router::build_router;
use crate::state::AppState;
use crate::synth::MetricTargets;
use crate::timers::BroadcastTimers;

/// Errors that can occur when starting or running the broadcast server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// The metric target topology could not be built.
    #[error("target topology error: {source}")]
    Topology {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },
}

/// A server that is accepting connections and broadcasting.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    state: Arc<AppState>,
    timers: BroadcastTimers,
    stop_listener: oneshot::Sender<()>,
    serve: JoinHandle<Result<(), ServerError>>,
}

/// Start the broadcast server.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or cannot be
/// bound, or [`ServerError::Topology`] if the configured target
/// environment's topology fails to build.
pub async fn start_server(config: &TopologyConfig) -> Result<RunningServer, ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let targets = metric_targets(config)?;
    let state = Arc::new(AppState::new(config.broadcast.outbound_buffer));
    let router = build_router(Arc::clone(&state), &config.server.ws_path);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let (stop_listener, stopped) = oneshot::channel::<()>();
    let serve = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await
            .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
    });

    let timers = BroadcastTimers::spawn(&state.registry, &config.broadcast, &targets);

    info!(
        %local_addr,
        ws_path = %config.server.ws_path,
        targeted_nodes = targets.node_ids.len(),
        "broadcast server listening"
    );

    Ok(RunningServer {
        local_addr,
        state,
        timers,
        stop_listener,
        serve,
    })
}

fn metric_targets(config: &TopologyConfig) -> Result<MetricTargets, GraphError> {
    let Some(environment) = config.broadcast.target_environment else {
        return Ok(MetricTargets::default());
    };
    let graph = starting_topology(environment)?;
    Ok(MetricTargets {
        environment: Some(environment),
        node_ids: graph.nodes().iter().map(|n| n.id.clone()).collect(),
    })
}

impl RunningServer {
    /// Address the listener is bound to.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared state, for inspecting the registry.
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve until `signal` resolves, then shut down.
    ///
    /// If the listener fails first, the timers and sockets are still shut
    /// down before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the listener failed.
    pub async fn run_until(mut self, signal: impl Future<Output = ()>) -> Result<(), ServerError> {
        let finished_early = tokio::select! {
            () = signal => None,
            joined = &mut self.serve => Some(joined),
        };

        match finished_early {
            None => {
                info!("shutdown signal received");
                self.shutdown().await
            }
            Some(joined) => {
                error!("listener exited before shutdown was requested");
                stop_background(self.timers, &self.state).await;
                flatten(joined)
            }
        }
    }

    /// Stop accepting, stop the timers, close every socket, and wait for
    /// the listener task.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the listener failed.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        let _ = self.stop_listener.send(());
        stop_background(self.timers, &self.state).await;
        let result = flatten(self.serve.await);
        info!("broadcast server stopped");
        result
    }
}

async fn stop_background(timers: BroadcastTimers, state: &AppState) {
    timers.shutdown().await;
    state.registry.close_all().await;
}

fn flatten(
    joined: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    joined.map_err(|e| ServerError::Serve(format!("listener task failed: {e}")))?
}
