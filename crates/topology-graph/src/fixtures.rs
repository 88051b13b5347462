//! Starting topologies for each environment.
//!
//! These are the datasets the dashboard loads when a viewer switches
//! environment. Production is the full multi-tier stack; staging mirrors
//! it at reduced scale; development is a single-box sandbox.
//!
//! Node ids of logical services (`api-gateway`, `auth-service`, ...) match
//! the service names the broadcast server reports in `system_status`, so
//! status roll-ups land on the right node.
//!
//! Every node carries its hand-placed dashboard position. Those are the
//! positions the manual layout restores.

use topology_types::{
    Edge, EdgeMetrics, Environment, Node, NodeDetails, NodeKind, NodeMetrics, NodeStatus,
};

use crate::error::GraphError;
use crate::graph::TopologyGraph;

/// Helper to build [`NodeMetrics`] with cpu, memory, and latency.
const fn usage(cpu: f64, memory: f64, latency_ms: f64) -> NodeMetrics {
    NodeMetrics {
        cpu: Some(cpu),
        memory: Some(memory),
        connections: None,
        latency_ms: Some(latency_ms),
        requests_per_sec: None,
    }
}

/// Helper to build [`NodeDetails`].
fn placed(region: &str, zone: &str, instance_type: &str, replicas: u32) -> NodeDetails {
    NodeDetails {
        region: Some(region.to_owned()),
        zone: Some(zone.to_owned()),
        instance_type: Some(instance_type.to_owned()),
        replicas: Some(replicas),
    }
}

/// Helper to build an [`Edge`] with traffic metrics.
fn link(
    id: &str,
    source: &str,
    target: &str,
    throughput: f64,
    utilization: f64,
    latency_ms: f64,
    volume: &str,
) -> Edge {
    Edge::new(id, source, target).with_metrics(EdgeMetrics {
        throughput,
        utilization,
        latency_ms,
        error_rate: 0.1,
        packet_discards: 0,
        traffic_volume: volume.to_owned(),
    })
}

/// Create the starting graph for an environment.
///
/// # Errors
///
/// Returns [`GraphError`] if the hard-coded dataset violates a graph
/// invariant (should not happen).
pub fn starting_topology(environment: Environment) -> Result<TopologyGraph, GraphError> {
    match environment {
        Environment::Production => production(),
        Environment::Staging => staging(),
        Environment::Development => development(),
    }
}

#[allow(clippy::too_many_lines)]
fn production() -> Result<TopologyGraph, GraphError> {
    let region = "us-east-1";
    let nodes = vec![
        Node::new("cdn", "Global CDN", NodeKind::External)
            .at(450.0, 60.0)
            .with_status(NodeStatus::Healthy),
        Node::new("edge-lb", "Edge Load Balancer", NodeKind::LoadBalancer)
            .at(450.0, 150.0)
            .with_metrics(usage(32.0, 41.0, 12.0))
            .with_details(placed(region, "us-east-1a", "alb", 2)),
        Node::new("api-gateway", "API Gateway", NodeKind::Gateway)
            .at(450.0, 240.0)
            .with_metrics(usage(58.0, 62.0, 45.0))
            .with_details(placed(region, "us-east-1a", "c6g.xlarge", 3)),
        Node::new("vpc-main", "Main VPC", NodeKind::VirtualNetwork)
            .at(150.0, 330.0)
            .with_details(placed(region, "multi-az", "10.0.0.0/16", 1)),
        Node::new("k8s-prod", "Production Cluster", NodeKind::OrchestratorCluster)
            .at(450.0, 330.0)
            .with_metrics(usage(66.0, 71.0, 38.0))
            .with_details(placed(region, "multi-az", "eks-1.29", 12)),
        Node::new("auth-service", "Auth Service", NodeKind::Compute)
            .at(250.0, 440.0)
            .with_metrics(usage(44.0, 52.0, 28.0))
            .with_details(placed(region, "us-east-1b", "m6i.large", 4)),
        Node::new("user-service", "User Service", NodeKind::Compute)
            .at(450.0, 440.0)
            .with_metrics(usage(73.0, 64.0, 61.0))
            .with_details(placed(region, "us-east-1b", "m6i.xlarge", 6)),
        Node::new("payment-service", "Payment Service", NodeKind::Compute)
            .at(650.0, 440.0)
            .with_metrics(usage(88.0, 77.0, 132.0))
            .with_details(placed(region, "us-east-1c", "m6i.xlarge", 4)),
        Node::new("notification-service", "Notification Service", NodeKind::Queue)
            .at(800.0, 540.0)
            .with_metrics(NodeMetrics {
                connections: Some(48),
                ..NodeMetrics::default()
            })
            .with_status(NodeStatus::Healthy),
        Node::new("redis-cache", "Session Cache", NodeKind::Cache)
            .at(150.0, 540.0)
            .with_metrics(usage(22.0, 81.0, 2.0))
            .with_details(placed(region, "us-east-1a", "cache.r6g.large", 3)),
        Node::new("orders-db", "Orders Database", NodeKind::Database)
            .at(550.0, 540.0)
            .with_metrics(NodeMetrics {
                connections: Some(412),
                ..usage(61.0, 74.0, 18.0)
            })
            .with_details(placed(region, "us-east-1b", "db.r6g.2xlarge", 2)),
        Node::new("assets-bucket", "Asset Storage", NodeKind::Storage)
            .at(350.0, 540.0)
            .with_status(NodeStatus::Healthy)
            .with_details(placed(region, "regional", "s3-standard", 1)),
        Node::new("analytics-service", "Analytics Pipeline", NodeKind::Compute)
            .at(550.0, 640.0)
            .with_metrics(usage(39.0, 58.0, 94.0))
            .with_details(placed("us-west-2", "us-west-2a", "r6i.2xlarge", 2)),
    ];

    let edges = vec![
        link("cdn-lb", "cdn", "edge-lb", 5200.0, 46.0, 8.0, "18.4 GB/h"),
        link("lb-gw", "edge-lb", "api-gateway", 4800.0, 52.0, 4.0, "16.1 GB/h"),
        link("gw-cluster", "api-gateway", "k8s-prod", 4600.0, 58.0, 3.0, "15.2 GB/h"),
        link("cluster-auth", "k8s-prod", "auth-service", 1900.0, 37.0, 2.0, "2.3 GB/h"),
        link("cluster-user", "k8s-prod", "user-service", 1600.0, 44.0, 2.0, "4.8 GB/h"),
        link("cluster-pay", "k8s-prod", "payment-service", 700.0, 63.0, 3.0, "1.1 GB/h"),
        link("auth-cache", "auth-service", "redis-cache", 3100.0, 29.0, 1.0, "0.9 GB/h"),
        link("user-db", "user-service", "orders-db", 950.0, 48.0, 6.0, "3.2 GB/h"),
        link("pay-db", "payment-service", "orders-db", 620.0, 71.0, 9.0, "1.7 GB/h"),
        link("pay-notify", "payment-service", "notification-service", 240.0, 18.0, 5.0, "0.2 GB/h"),
        link("user-assets", "user-service", "assets-bucket", 410.0, 22.0, 14.0, "6.5 GB/h"),
        link("db-analytics", "orders-db", "analytics-service", 120.0, 34.0, 42.0, "9.8 GB/h"),
        link("vpc-cluster", "vpc-main", "k8s-prod", 0.0, 0.0, 0.0, "n/a"),
    ];

    TopologyGraph::from_parts(Environment::Production, nodes, edges)
}

fn staging() -> Result<TopologyGraph, GraphError> {
    let region = "eu-west-1";
    let nodes = vec![
        Node::new("edge-lb", "Staging Load Balancer", NodeKind::LoadBalancer)
            .at(450.0, 80.0)
            .with_metrics(usage(12.0, 20.0, 9.0))
            .with_details(placed(region, "eu-west-1a", "alb", 1)),
        Node::new("api-gateway", "API Gateway", NodeKind::Gateway)
            .at(450.0, 190.0)
            .with_metrics(usage(18.0, 33.0, 22.0))
            .with_details(placed(region, "eu-west-1a", "c6g.large", 1)),
        Node::new("k8s-staging", "Staging Cluster", NodeKind::OrchestratorCluster)
            .at(450.0, 300.0)
            .with_metrics(usage(35.0, 48.0, 30.0))
            .with_details(placed(region, "eu-west-1a", "eks-1.29", 3)),
        Node::new("auth-service", "Auth Service", NodeKind::Compute)
            .at(300.0, 410.0)
            .with_metrics(usage(15.0, 28.0, 19.0)),
        Node::new("user-service", "User Service", NodeKind::Compute)
            .at(600.0, 410.0)
            .with_metrics(usage(24.0, 31.0, 35.0)),
        Node::new("staging-db", "Staging Database", NodeKind::Database)
            .at(600.0, 520.0)
            .with_metrics(usage(19.0, 44.0, 11.0))
            .with_details(placed(region, "eu-west-1b", "db.t4g.large", 1)),
    ];

    let edges = vec![
        link("lb-gw", "edge-lb", "api-gateway", 210.0, 8.0, 3.0, "0.4 GB/h"),
        link("gw-cluster", "api-gateway", "k8s-staging", 200.0, 11.0, 2.0, "0.4 GB/h"),
        link("cluster-auth", "k8s-staging", "auth-service", 90.0, 6.0, 2.0, "0.1 GB/h"),
        link("cluster-user", "k8s-staging", "user-service", 110.0, 9.0, 2.0, "0.2 GB/h"),
        link("user-db", "user-service", "staging-db", 60.0, 12.0, 4.0, "0.1 GB/h"),
    ];

    TopologyGraph::from_parts(Environment::Staging, nodes, edges)
}

fn development() -> Result<TopologyGraph, GraphError> {
    let nodes = vec![
        Node::new("api-gateway", "Local Gateway", NodeKind::Gateway)
            .at(200.0, 200.0)
            .with_metrics(usage(5.0, 12.0, 4.0)),
        Node::new("dev-box", "Dev Workstation", NodeKind::Compute)
            .at(450.0, 200.0)
            .with_metrics(usage(27.0, 63.0, 7.0))
            .with_details(placed("local", "local", "docker", 1)),
        Node::new("dev-db", "Postgres (docker)", NodeKind::Database)
            .at(450.0, 400.0)
            .with_metrics(usage(3.0, 9.0, 1.0)),
        Node::new("mock-payments", "Payments Sandbox", NodeKind::External)
            .at(700.0, 200.0),
    ];

    let edges = vec![
        link("gw-box", "api-gateway", "dev-box", 4.0, 1.0, 1.0, "2 MB/h"),
        link("box-db", "dev-box", "dev-db", 2.0, 1.0, 1.0, "1 MB/h"),
        link("box-payments", "dev-box", "mock-payments", 0.5, 0.2, 110.0, "<1 MB/h"),
    ];

    TopologyGraph::from_parts(Environment::Development, nodes, edges)
}
