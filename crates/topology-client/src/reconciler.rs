//! Merging broadcast messages into the local graph.
//!
//! Every inbound message is a small synchronous merge. Messages only ever
//! touch metrics and status; positions belong to the layout engine and the
//! user's drags.
//!
//! A `metric_update` lands on a node when its tags carry `node_id`, or on
//! an edge when they carry `edge_id`. The measurement picks the field:
//!
//! | measurement          | node field         | edge field   |
//! |----------------------|--------------------|--------------|
//! | `cpu_usage`          | `cpu`              |              |
//! | `memory_usage`       | `memory`           |              |
//! | `request_latency`    | `latency_ms`       | `latency_ms` |
//! | `network_throughput` | `requests_per_sec` | `throughput` |
//! | `error_rate`         |                    | `error_rate` |
//! | `disk_io`            |                    |              |

use topology_graph::{StatusChange, TopologyGraph};
use topology_types::{
    EdgeMetricsDelta, Measurement, MetricUpdate, NodeMetrics, NodeStatus, ServerEvent,
    ServerMessage, SystemStatus,
};
use tracing::{debug, trace};

/// Conceptual state of the reconciler with respect to layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcilerState {
    /// No layout outstanding.
    #[default]
    Idle,
    /// A layout was requested and its result has not been applied.
    AwaitingLayout {
        /// Generation of the outstanding request.
        generation: u64,
    },
}

/// Why a message left the graph untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The sample carried neither `node_id` nor `edge_id`.
    Untargeted,
    /// The targeted id is not in the graph.
    UnknownTarget,
    /// The measurement has no field on the targeted entity.
    UnmappedMeasurement,
    /// The event type never changes the graph.
    NoGraphEffect,
}

/// What applying one message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A node's metrics were merged.
    NodeUpdated {
        /// Node that changed.
        node_id: String,
        /// Status before and after.
        change: StatusChange,
    },
    /// An edge's metrics were merged.
    EdgeUpdated {
        /// Edge that changed.
        edge_id: String,
    },
    /// Service statuses were copied onto matching nodes.
    StatusesApplied {
        /// Nodes whose status was set.
        updated: usize,
    },
    /// An alert was recorded in the feed.
    AlertRecorded,
    /// Nothing changed.
    Ignored(IgnoreReason),
}

/// Node field a measurement writes, as a one-field delta.
pub fn node_delta(measurement: Measurement, value: f64) -> Option<NodeMetrics> {
    let mut delta = NodeMetrics::default();
    match measurement {
        Measurement::CpuUsage => delta.cpu = Some(value),
        Measurement::MemoryUsage => delta.memory = Some(value),
        Measurement::RequestLatency => delta.latency_ms = Some(value),
        Measurement::NetworkThroughput => delta.requests_per_sec = Some(value),
        Measurement::ErrorRate | Measurement::DiskIo => return None,
    }
    Some(delta)
}

/// Edge field a measurement writes, as a one-field delta.
pub fn edge_delta(measurement: Measurement, value: f64) -> Option<EdgeMetricsDelta> {
    let mut delta = EdgeMetricsDelta::default();
    match measurement {
        Measurement::RequestLatency => delta.latency_ms = Some(value),
        Measurement::NetworkThroughput => delta.throughput = Some(value),
        Measurement::ErrorRate => delta.error_rate = Some(value),
        Measurement::CpuUsage | Measurement::MemoryUsage | Measurement::DiskIo => return None,
    }
    Some(delta)
}

/// Apply one server message to the graph.
///
/// Alerts, acknowledgements and pongs have no graph effect and come back
/// as [`IgnoreReason::NoGraphEffect`].
pub fn apply(graph: &mut TopologyGraph, message: &ServerMessage) -> ApplyOutcome {
    let outcome = match &message.event {
        ServerEvent::MetricUpdate(update) => apply_metric(graph, update),
        ServerEvent::SystemStatus(status) => apply_status(graph, status),
        ServerEvent::Alert(_) | ServerEvent::Connected(_) | ServerEvent::Pong(_) => {
            ApplyOutcome::Ignored(IgnoreReason::NoGraphEffect)
        }
    };
    trace!(event = message.kind(), outcome = ?outcome, "message applied");
    outcome
}

fn apply_metric(graph: &mut TopologyGraph, update: &MetricUpdate) -> ApplyOutcome {
    let tags = update.tags.as_ref();
    if let Some(node_id) = tags.and_then(|t| t.node_id.as_deref()) {
        if !graph.contains_node(node_id) {
            debug!(node = node_id, "metric for unknown node ignored");
            return ApplyOutcome::Ignored(IgnoreReason::UnknownTarget);
        }
        let Some(delta) = node_delta(update.measurement, update.value) else {
            return ApplyOutcome::Ignored(IgnoreReason::UnmappedMeasurement);
        };
        return match graph.apply_node_update(node_id, &delta) {
            Ok(change) => ApplyOutcome::NodeUpdated {
                node_id: node_id.to_owned(),
                change,
            },
            Err(_) => ApplyOutcome::Ignored(IgnoreReason::UnknownTarget),
        };
    }

    if let Some(edge_id) = tags.and_then(|t| t.edge_id.as_deref()) {
        if !graph.contains_edge(edge_id) {
            debug!(edge = edge_id, "metric for unknown edge ignored");
            return ApplyOutcome::Ignored(IgnoreReason::UnknownTarget);
        }
        let Some(delta) = edge_delta(update.measurement, update.value) else {
            return ApplyOutcome::Ignored(IgnoreReason::UnmappedMeasurement);
        };
        return match graph.apply_edge_update(edge_id, &delta) {
            Ok(()) => ApplyOutcome::EdgeUpdated {
                edge_id: edge_id.to_owned(),
            },
            Err(_) => ApplyOutcome::Ignored(IgnoreReason::UnknownTarget),
        };
    }

    ApplyOutcome::Ignored(IgnoreReason::Untargeted)
}

fn apply_status(graph: &mut TopologyGraph, status: &SystemStatus) -> ApplyOutcome {
    let mut updated: usize = 0;
    for service in &status.services {
        if !graph.contains_node(&service.name) {
            continue;
        }
        if let Ok(true) = graph.set_node_status(&service.name, NodeStatus::from(service.status)) {
            updated = updated.saturating_add(1);
        }
    }
    ApplyOutcome::StatusesApplied { updated }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;
    use topology_types::{
        Edge, Environment, MetricTags, Node, NodeKind, Pong, ServiceHealth, ServiceStatus,
    };

    use super::*;

    fn graph() -> TopologyGraph {
        TopologyGraph::from_parts(
            Environment::Production,
            [
                Node::new("api", "API", NodeKind::Gateway)
                    .with_metrics(NodeMetrics {
                        cpu: Some(40.0),
                        latency_ms: Some(20.0),
                        ..NodeMetrics::default()
                    })
                    .at(100.0, 100.0),
                Node::new("queue", "Queue", NodeKind::Queue),
            ],
            [Edge::new("api-queue", "api", "queue")],
        )
        .unwrap()
    }

    fn metric(measurement: Measurement, value: f64, tags: MetricTags) -> ServerMessage {
        ServerMessage::now(ServerEvent::MetricUpdate(MetricUpdate {
            measurement,
            value,
            timestamp: Utc::now(),
            tags: Some(tags),
        }))
    }

    fn on_node(id: &str) -> MetricTags {
        MetricTags {
            node_id: Some(id.to_owned()),
            ..MetricTags::default()
        }
    }

    fn on_edge(id: &str) -> MetricTags {
        MetricTags {
            edge_id: Some(id.to_owned()),
            ..MetricTags::default()
        }
    }

    #[test]
    fn cpu_spike_turns_node_critical_without_moving_it() {
        let mut g = graph();
        let outcome = apply(&mut g, &metric(Measurement::CpuUsage, 91.0, on_node("api")));

        let ApplyOutcome::NodeUpdated { change, .. } = outcome else {
            panic!("expected node update, got {outcome:?}");
        };
        assert_eq!(change.previous, NodeStatus::Healthy);
        assert_eq!(change.current, NodeStatus::Critical);
        let node = g.node("api").unwrap();
        assert_eq!(node.position.map(|p| p.x), Some(100.0));
        assert_eq!(node.metrics.as_ref().and_then(|m| m.latency_ms), Some(20.0));
    }

    #[test]
    fn edge_error_rate_is_clamped() {
        let mut g = graph();
        let outcome = apply(&mut g, &metric(Measurement::ErrorRate, 140.0, on_edge("api-queue")));
        assert_eq!(
            outcome,
            ApplyOutcome::EdgeUpdated {
                edge_id: String::from("api-queue")
            }
        );
        assert!((g.edge("api-queue").unwrap().metrics.error_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ignored_cases_leave_graph_untouched() {
        let mut g = graph();
        let before = g.clone();
        let cases = [
            (metric(Measurement::CpuUsage, 99.0, MetricTags::default()), IgnoreReason::Untargeted),
            (metric(Measurement::CpuUsage, 99.0, on_node("ghost")), IgnoreReason::UnknownTarget),
            (metric(Measurement::CpuUsage, 99.0, on_edge("ghost")), IgnoreReason::UnknownTarget),
            (metric(Measurement::DiskIo, 300.0, on_node("api")), IgnoreReason::UnmappedMeasurement),
            (metric(Measurement::CpuUsage, 99.0, on_edge("api-queue")), IgnoreReason::UnmappedMeasurement),
            (
                ServerMessage::now(ServerEvent::Pong(Pong { timestamp: Utc::now() })),
                IgnoreReason::NoGraphEffect,
            ),
        ];
        for (message, reason) in cases {
            assert_eq!(apply(&mut g, &message), ApplyOutcome::Ignored(reason));
        }
        assert_eq!(g, before);
    }

    #[test]
    fn system_status_only_sets_nodes_without_derivation_inputs() {
        let mut g = graph();
        let status = ServerMessage::now(ServerEvent::SystemStatus(SystemStatus {
            services: vec![
                ServiceStatus {
                    name: String::from("api"),
                    status: ServiceHealth::Warning,
                    latency: 12,
                },
                ServiceStatus {
                    name: String::from("queue"),
                    status: ServiceHealth::Warning,
                    latency: 30,
                },
                ServiceStatus {
                    name: String::from("billing"),
                    status: ServiceHealth::Healthy,
                    latency: 50,
                },
            ],
            timestamp: Utc::now(),
        }));

        assert_eq!(apply(&mut g, &status), ApplyOutcome::StatusesApplied { updated: 1 });
        assert_eq!(g.node("api").unwrap().status, NodeStatus::Healthy);
        assert_eq!(g.node("queue").unwrap().status, NodeStatus::Warning);
    }

    #[test]
    fn measurement_mapping_table() {
        assert!(node_delta(Measurement::MemoryUsage, 1.0).is_some_and(|d| d.memory == Some(1.0)));
        assert!(node_delta(Measurement::NetworkThroughput, 5.0)
            .is_some_and(|d| d.requests_per_sec == Some(5.0)));
        assert!(node_delta(Measurement::ErrorRate, 1.0).is_none());
        assert!(edge_delta(Measurement::NetworkThroughput, 5.0)
            .is_some_and(|d| d.throughput == Some(5.0)));
        assert!(edge_delta(Measurement::RequestLatency, 7.0)
            .is_some_and(|d| d.latency_ms == Some(7.0)));
        assert!(edge_delta(Measurement::MemoryUsage, 1.0).is_none());
    }
}
