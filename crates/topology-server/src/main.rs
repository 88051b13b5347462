//! Broadcast server binary for the live topology engine.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `topology-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Bind the listener and start the three broadcast timers
//! 4. Serve until `Ctrl-C`
//! 5. Stop accepting, stop the timers, close every socket, exit

mod error;

use std::path::Path;

use topology_broadcast::config::LoggingSettings;
use topology_broadcast::{LogFormat, TopologyConfig, start_server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::BinError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "topology-config.yaml";

#[tokio::main]
async fn main() -> Result<(), BinError> {
    let config = TopologyConfig::load_or_default(Path::new(CONFIG_PATH))?;
    init_tracing(&config.logging);

    info!(
        host = %config.server.host,
        port = config.server.port,
        ws_path = %config.server.ws_path,
        metric_interval_ms = config.broadcast.metric_interval_ms,
        status_interval_ms = config.broadcast.status_interval_ms,
        alert_interval_ms = config.broadcast.alert_interval_ms,
        seeded = config.broadcast.seed.is_some(),
        "Configuration loaded"
    );

    let server = start_server(&config).await?;
    server.run_until(shutdown_signal()).await?;

    info!("topology-server shutdown complete");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Resolve on `Ctrl-C`. If the handler cannot be installed, never resolve
/// so the server keeps running rather than shutting down at once.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
