//! Core entity structs: nodes, edges, their metrics, and positions.
//!
//! Metrics are plain values here. Merging a partial update into an existing
//! metrics record is a value operation and lives next to the type; status
//! derivation and referential integrity belong to the graph model.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{NodeKind, NodeStatus};

/// Lower bound of a percentage metric.
pub const PERCENT_MIN: f64 = 0.0;

/// Upper bound of a percentage metric.
pub const PERCENT_MAX: f64 = 100.0;

/// Clamp a percentage into `[0, 100]`. `NaN` collapses to zero.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        PERCENT_MIN
    } else {
        value.clamp(PERCENT_MIN, PERCENT_MAX)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Canvas coordinates of a node. Owned by the layout engine and user drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Quantitative attributes of a node. Every field is optional, so the same
/// type doubles as a partial update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeMetrics {
    /// CPU utilisation in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    /// Memory utilisation in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    /// Open connection count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u64>,
    /// Request latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Requests served per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_sec: Option<f64>,
}

impl NodeMetrics {
    /// Merge a partial update field by field. Fields absent from `delta`
    /// are left untouched.
    pub fn merge(&mut self, delta: &Self) {
        if let Some(cpu) = delta.cpu {
            self.cpu = Some(cpu);
        }
        if let Some(memory) = delta.memory {
            self.memory = Some(memory);
        }
        if let Some(connections) = delta.connections {
            self.connections = Some(connections);
        }
        if let Some(latency) = delta.latency_ms {
            self.latency_ms = Some(latency);
        }
        if let Some(rps) = delta.requests_per_sec {
            self.requests_per_sec = Some(rps);
        }
    }

    /// Whether the record carries any input to status derivation.
    pub const fn has_status_inputs(&self) -> bool {
        self.cpu.is_some() || self.latency_ms.is_some()
    }

    /// Whether every field is absent.
    pub const fn is_empty(&self) -> bool {
        self.cpu.is_none()
            && self.memory.is_none()
            && self.connections.is_none()
            && self.latency_ms.is_none()
            && self.requests_per_sec.is_none()
    }
}

/// Descriptive placement details for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeDetails {
    /// Cloud region, e.g. `us-east-1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Availability zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Instance type or SKU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Replica count for replicated services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

/// An infrastructure node in a topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Node {
    /// Unique id within the graph.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Infrastructure role.
    pub kind: NodeKind,
    /// Current health status.
    #[serde(default)]
    pub status: NodeStatus,
    /// Latest metrics, if any have been reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<NodeMetrics>,
    /// Placement details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<NodeDetails>,
    /// Canvas position; `None` until laid out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    /// Create a node with no metrics, no details, and no position.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            status: NodeStatus::Unknown,
            metrics: None,
            details: None,
            position: None,
        }
    }

    /// Attach metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: NodeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attach placement details.
    #[must_use]
    pub fn with_details(mut self, details: NodeDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Set an explicit status.
    #[must_use]
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// Set an initial position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Traffic metrics on an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EdgeMetrics {
    /// Requests per second carried by the link.
    pub throughput: f64,
    /// Link utilisation in percent, `[0, 100]`.
    pub utilization: f64,
    /// Link latency in milliseconds.
    pub latency_ms: f64,
    /// Error rate in percent, `[0, 100]`.
    pub error_rate: f64,
    /// Dropped packet count.
    pub packet_discards: u64,
    /// Human-readable traffic volume, e.g. `1.2 GB/h`.
    pub traffic_volume: String,
}

impl EdgeMetrics {
    /// Return a copy with percentage fields clamped into `[0, 100]`.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.utilization = clamp_percent(self.utilization);
        self.error_rate = clamp_percent(self.error_rate);
        self
    }

    /// Whether percentage fields already sit inside `[0, 100]`.
    pub fn is_in_range(&self) -> bool {
        (PERCENT_MIN..=PERCENT_MAX).contains(&self.utilization)
            && (PERCENT_MIN..=PERCENT_MAX).contains(&self.error_rate)
    }

    /// Merge a partial update field by field, clamping percentages.
    pub fn merge(&mut self, delta: &EdgeMetricsDelta) {
        if let Some(throughput) = delta.throughput {
            self.throughput = throughput;
        }
        if let Some(utilization) = delta.utilization {
            self.utilization = clamp_percent(utilization);
        }
        if let Some(latency) = delta.latency_ms {
            self.latency_ms = latency;
        }
        if let Some(error_rate) = delta.error_rate {
            self.error_rate = clamp_percent(error_rate);
        }
        if let Some(discards) = delta.packet_discards {
            self.packet_discards = discards;
        }
        if let Some(volume) = &delta.traffic_volume {
            self.traffic_volume.clone_from(volume);
        }
    }
}

/// A partial update to [`EdgeMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EdgeMetricsDelta {
    /// New throughput.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<f64>,
    /// New utilisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
    /// New latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// New error rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,
    /// New discard count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_discards: Option<u64>,
    /// New traffic volume string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_volume: Option<String>,
}

/// A directed link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Edge {
    /// Unique id within the graph.
    pub id: String,
    /// Id of the source node.
    pub source_id: String,
    /// Id of the target node.
    pub target_id: String,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Traffic metrics.
    #[serde(default)]
    pub metrics: EdgeMetrics,
}

impl Edge {
    /// Create an edge with zeroed metrics.
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: None,
            metrics: EdgeMetrics::default(),
        }
    }

    /// Attach metrics, clamping percentages.
    #[must_use]
    pub fn with_metrics(mut self, metrics: EdgeMetrics) -> Self {
        self.metrics = metrics.clamped();
        self
    }

    /// Attach a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether the edge starts and ends at the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}
