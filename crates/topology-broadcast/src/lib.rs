//! Broadcast server for the live topology engine.
//!
//! Maintains a registry of viewer `WebSocket` connections and, on three
//! independent timers, synthesizes `metric_update`, `system_status` and
//! `alert` events and fans them out to every viewer. Delivery is
//! at-most-once: a viewer that cannot keep up misses frames.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`registry`] -- Connection registry and fan-out
//! - [`synth`] -- Seeded event synthesis
//! - [`timers`] -- The three broadcast timers
//! - [`ws`] -- `WebSocket` connection handler
//! - [`router`] -- Axum router
//! - [`server`] -- Startup and ordered shutdown

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;
pub mod synth;
pub mod timers;
pub mod ws;

pub use config::{ConfigError, LogFormat, TopologyConfig};
pub use error::BroadcastError;
pub use registry::{ConnectionRegistry, FanOutReport};
pub use server::{RunningServer, ServerError, start_server};
pub use state::AppState;
