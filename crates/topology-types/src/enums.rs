//! Enumeration types for the live topology engine.
//!
//! Every enum here crosses the wire to the dashboard, so serde renames are
//! part of the contract: node kinds are kebab-case, statuses and
//! environments are lowercase, and measurements are `snake_case`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// The infrastructure role a topology node plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum NodeKind {
    /// Layer 4/7 load balancer fronting a pool.
    LoadBalancer,
    /// A compute instance or VM.
    Compute,
    /// A relational or document database.
    Database,
    /// Object or block storage.
    Storage,
    /// An in-memory cache.
    Cache,
    /// A message queue or stream.
    Queue,
    /// An API gateway.
    Gateway,
    /// A third-party service outside the environment.
    External,
    /// A container orchestrator cluster.
    OrchestratorCluster,
    /// A virtual network boundary.
    VirtualNetwork,
}

/// Health status of a node.
///
/// When a node carries cpu or latency metrics the status is derived from
/// them; otherwise it is set directly by status events.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum NodeStatus {
    /// Operating within thresholds.
    Healthy,
    /// Above the warning thresholds.
    Warning,
    /// Above the critical thresholds.
    Critical,
    /// No metrics and no explicit status yet.
    #[default]
    Unknown,
}

impl NodeStatus {
    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Environments
// ---------------------------------------------------------------------------

/// A deployment environment. Each environment owns exactly one graph.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Environment {
    /// Live customer-facing infrastructure.
    #[default]
    Production,
    /// Pre-release mirror of production.
    Staging,
    /// Developer sandbox.
    Development,
}

impl Environment {
    /// All environments in display order.
    pub const ALL: [Self; 3] = [Self::Production, Self::Staging, Self::Development];

    /// Wire name of the environment.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" | "stage" => Ok(Self::Staging),
            "development" | "dev" => Ok(Self::Development),
            other => Err(UnknownEnvironment(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Broadcast payload enums
// ---------------------------------------------------------------------------

/// A measurement the broadcast server synthesizes in `metric_update` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Measurement {
    /// CPU utilisation in percent.
    CpuUsage,
    /// Memory utilisation in percent.
    MemoryUsage,
    /// Network throughput in requests per second.
    NetworkThroughput,
    /// Disk operations per second.
    DiskIo,
    /// Request latency in milliseconds.
    RequestLatency,
    /// Error rate in percent.
    ErrorRate,
}

impl Measurement {
    /// Every measurement, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::CpuUsage,
        Self::MemoryUsage,
        Self::NetworkThroughput,
        Self::DiskIo,
        Self::RequestLatency,
        Self::ErrorRate,
    ];

    /// Wire name of the measurement.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CpuUsage => "cpu_usage",
            Self::MemoryUsage => "memory_usage",
            Self::NetworkThroughput => "network_throughput",
            Self::DiskIo => "disk_io",
            Self::RequestLatency => "request_latency",
            Self::ErrorRate => "error_rate",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a broadcast alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AlertSeverity {
    /// Informational.
    Info,
    /// Needs attention soon.
    Warning,
    /// Needs attention now.
    Critical,
}

/// Health of a logical service in a `system_status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ServiceHealth {
    /// Service is healthy.
    Healthy,
    /// Service is degraded.
    Warning,
}

impl From<ServiceHealth> for NodeStatus {
    fn from(health: ServiceHealth) -> Self {
        match health {
            ServiceHealth::Healthy => Self::Healthy,
            ServiceHealth::Warning => Self::Warning,
        }
    }
}
