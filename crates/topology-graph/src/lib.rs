//! Graph model for the live topology engine.
//!
//! This crate owns the per-environment graph of infrastructure nodes and
//! links, the metric merge rules, and the status derivation shared with the
//! legacy dashboard.
//!
//! # Modules
//!
//! - [`error`] -- Error types for graph operations.
//! - [`graph`] -- [`TopologyGraph`]: insertion-ordered nodes and edges with
//!   referential integrity and field-by-field metric merges.
//! - [`status`] -- The three-tier cpu/latency status rule.
//! - [`fixtures`] -- Starting topologies for production, staging, and
//!   development.

pub mod error;
pub mod fixtures;
pub mod graph;
pub mod status;

// Re-export primary types at crate root.
pub use error::GraphError;
pub use fixtures::starting_topology;
pub use graph::{GraphSnapshot, StatusChange, TopologyGraph};
pub use status::{derive_status, derived_status};
