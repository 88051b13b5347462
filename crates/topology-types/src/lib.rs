//! Shared type definitions for the live topology engine.
//!
//! This crate is the single source of truth for the value types that cross
//! crate and process boundaries: graph entities, their metrics, and the
//! WebSocket wire messages. Types flow downstream to `TypeScript` via
//! `ts-rs` for the topology dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for runtime-minted identifiers
//! - [`enums`] -- Node kinds, statuses, environments, measurements
//! - [`structs`] -- Nodes, edges, metrics, positions
//! - [`messages`] -- Server and client WebSocket messages

pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AlertSeverity, Environment, Measurement, NodeKind, NodeStatus, ServiceHealth,
    UnknownEnvironment,
};
pub use ids::ConnectionId;
pub use messages::{
    AlertEvent, ClientMessage, Connected, MetricTags, MetricUpdate, Pong, ServerEvent,
    ServerMessage, ServiceStatus, SubscribeRequest, SystemStatus,
};
pub use structs::{
    Edge, EdgeMetrics, EdgeMetricsDelta, Node, NodeDetails, NodeMetrics, Position, clamp_percent,
};
