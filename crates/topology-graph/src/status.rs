//! Status derivation from node metrics.
//!
//! The three-tier rule is shared with the legacy dashboard and must not
//! drift:
//!
//! | Status     | Condition                               |
//! |------------|-----------------------------------------|
//! | `critical` | `cpu > 85` or `latency_ms > 150`        |
//! | `warning`  | `cpu > 70` or `latency_ms > 80`         |
//! | `healthy`  | otherwise                               |
//!
//! Thresholds are strict: a cpu of exactly 85 is a warning, not critical.

use topology_types::{NodeMetrics, NodeStatus};

/// CPU percentage above which a node is critical.
pub const CPU_CRITICAL: f64 = 85.0;

/// CPU percentage above which a node is in warning.
pub const CPU_WARNING: f64 = 70.0;

/// Latency in milliseconds above which a node is critical.
pub const LATENCY_CRITICAL_MS: f64 = 150.0;

/// Latency in milliseconds above which a node is in warning.
pub const LATENCY_WARNING_MS: f64 = 80.0;

/// Apply the three-tier rule. Absent cpu or latency never trips a threshold.
pub fn derive_status(metrics: &NodeMetrics) -> NodeStatus {
    let above = |value: Option<f64>, threshold: f64| value.is_some_and(|v| v > threshold);

    if above(metrics.cpu, CPU_CRITICAL) || above(metrics.latency_ms, LATENCY_CRITICAL_MS) {
        NodeStatus::Critical
    } else if above(metrics.cpu, CPU_WARNING) || above(metrics.latency_ms, LATENCY_WARNING_MS) {
        NodeStatus::Warning
    } else {
        NodeStatus::Healthy
    }
}

/// Derive a status only when the metrics carry cpu or latency.
///
/// Returns `None` for nodes whose status is set directly by events.
pub fn derived_status(metrics: &NodeMetrics) -> Option<NodeStatus> {
    metrics
        .has_status_inputs()
        .then(|| derive_status(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(value: f64) -> NodeMetrics {
        NodeMetrics {
            cpu: Some(value),
            ..NodeMetrics::default()
        }
    }

    fn latency(value: f64) -> NodeMetrics {
        NodeMetrics {
            latency_ms: Some(value),
            ..NodeMetrics::default()
        }
    }

    #[test]
    fn cpu_boundaries() {
        assert_eq!(derive_status(&cpu(70.0)), NodeStatus::Healthy);
        assert_eq!(derive_status(&cpu(71.0)), NodeStatus::Warning);
        assert_eq!(derive_status(&cpu(85.0)), NodeStatus::Warning);
        assert_eq!(derive_status(&cpu(86.0)), NodeStatus::Critical);
    }

    #[test]
    fn latency_boundaries() {
        assert_eq!(derive_status(&latency(80.0)), NodeStatus::Healthy);
        assert_eq!(derive_status(&latency(81.0)), NodeStatus::Warning);
        assert_eq!(derive_status(&latency(150.0)), NodeStatus::Warning);
        assert_eq!(derive_status(&latency(151.0)), NodeStatus::Critical);
    }

    #[test]
    fn either_input_can_escalate() {
        let metrics = NodeMetrics {
            cpu: Some(20.0),
            latency_ms: Some(200.0),
            ..NodeMetrics::default()
        };
        assert_eq!(derive_status(&metrics), NodeStatus::Critical);

        let metrics = NodeMetrics {
            cpu: Some(75.0),
            latency_ms: Some(10.0),
            ..NodeMetrics::default()
        };
        assert_eq!(derive_status(&metrics), NodeStatus::Warning);
    }

    #[test]
    fn rule_holds_across_a_sweep() {
        // Walk a grid of cpu/latency values and check against the table.
        for cpu_step in 0..=40 {
            for latency_step in 0..=40 {
                let cpu = f64::from(cpu_step) * 2.5;
                let latency = f64::from(latency_step) * 5.0;
                let metrics = NodeMetrics {
                    cpu: Some(cpu),
                    latency_ms: Some(latency),
                    ..NodeMetrics::default()
                };
                let expected = if cpu > 85.0 || latency > 150.0 {
                    NodeStatus::Critical
                } else if cpu > 70.0 || latency > 80.0 {
                    NodeStatus::Warning
                } else {
                    NodeStatus::Healthy
                };
                assert_eq!(derive_status(&metrics), expected, "cpu={cpu} latency={latency}");
            }
        }
    }

    #[test]
    fn no_inputs_means_no_derivation() {
        let metrics = NodeMetrics {
            memory: Some(99.0),
            connections: Some(4),
            ..NodeMetrics::default()
        };
        assert_eq!(derived_status(&metrics), None);
        assert_eq!(derived_status(&cpu(90.0)), Some(NodeStatus::Critical));
    }
}
