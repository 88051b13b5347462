//! WebSocket wire messages exchanged between the broadcast server and viewers.
//!
//! Every frame is a JSON envelope `{ "type": ..., "data": {...}, "timestamp"? }`.
//! [`ServerEvent`] is adjacently tagged so the `type`/`data` pair falls out of
//! serde directly; [`ServerMessage`] flattens it next to the optional
//! envelope timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AlertSeverity, Environment, Measurement, ServiceHealth};
use crate::ids::ConnectionId;

// ---------------------------------------------------------------------------
// Server -> client payloads
// ---------------------------------------------------------------------------

/// Acknowledgement sent immediately after the WebSocket handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Connected {
    /// Id the server assigned to this connection.
    pub connection_id: ConnectionId,
    /// Greeting shown in the dashboard's connection indicator.
    pub message: String,
}

/// Tags attached to a synthesized metric sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MetricTags {
    /// Environment the sample was taken in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    /// Cloud region the sample was taken in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Node the sample applies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Edge the sample applies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

/// One measurement sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MetricUpdate {
    /// What was measured.
    pub measurement: Measurement,
    /// Sampled value.
    pub value: f64,
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Optional routing tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<MetricTags>,
}

/// An alert drawn from the server's alert catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AlertEvent {
    /// How urgent the alert is.
    pub severity: AlertSeverity,
    /// Human-readable description.
    pub message: String,
    /// Measurement that tripped the alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Measurement>,
    /// Observed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Threshold that was crossed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// When the alert fired.
    pub timestamp: DateTime<Utc>,
}

/// Health of one logical service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ServiceStatus {
    /// Service name.
    pub name: String,
    /// Current health.
    pub status: ServiceHealth,
    /// Probe latency in milliseconds.
    pub latency: u32,
}

/// Periodic health roll-up of every logical service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemStatus {
    /// One entry per service, in catalog order.
    pub services: Vec<ServiceStatus>,
    /// When the roll-up was taken.
    pub timestamp: DateTime<Utc>,
}

/// Reply to a client `ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Pong {
    /// Server time when the ping was answered.
    pub timestamp: DateTime<Utc>,
}

/// Every event the server pushes to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// Handshake acknowledgement.
    Connected(Connected),
    /// A single metric sample.
    MetricUpdate(MetricUpdate),
    /// An alert.
    Alert(AlertEvent),
    /// A service health roll-up.
    SystemStatus(SystemStatus),
    /// Answer to a ping.
    Pong(Pong),
}

impl ServerEvent {
    /// Wire name of the event type.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::MetricUpdate(_) => "metric_update",
            Self::Alert(_) => "alert",
            Self::SystemStatus(_) => "system_status",
            Self::Pong(_) => "pong",
        }
    }
}

/// Envelope wrapping a [`ServerEvent`] with an optional send timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// The event, flattened into `type` and `data`.
    #[serde(flatten)]
    pub event: ServerEvent,
    /// When the envelope was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ServerMessage {
    /// Wrap an event, stamping the envelope with the current time.
    pub fn now(event: ServerEvent) -> Self {
        Self {
            event,
            timestamp: Some(Utc::now()),
        }
    }

    /// Wrap an event without an envelope timestamp.
    pub const fn bare(event: ServerEvent) -> Self {
        Self {
            event,
            timestamp: None,
        }
    }

    /// Wire name of the wrapped event type.
    pub const fn kind(&self) -> &'static str {
        self.event.kind()
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        Self::now(event)
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Measurements a viewer is interested in. Advisory only: the server does
/// not narrow its fan-out by subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SubscribeRequest {
    /// Measurement names the viewer wants.
    #[serde(default)]
    pub metrics: Vec<String>,
}

/// Messages a viewer may send to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Declare interest in a set of measurements.
    Subscribe(SubscribeRequest),
    /// Liveness check, answered with `pong`.
    Ping,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn server_message_uses_type_data_envelope() {
        let msg = ServerMessage::now(ServerEvent::MetricUpdate(MetricUpdate {
            measurement: Measurement::CpuUsage,
            value: 51.5,
            timestamp: Utc::now(),
            tags: Some(MetricTags {
                environment: Some(Environment::Staging),
                region: Some(String::from("eu-west-1")),
                ..MetricTags::default()
            }),
        }));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "metric_update");
        assert_eq!(json["data"]["measurement"], "cpu_usage");
        assert_eq!(json["data"]["tags"]["environment"], "staging");
        assert!(json["data"]["tags"].get("node_id").is_none());
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn server_message_parses_without_envelope_timestamp() {
        let raw = r#"{
            "type": "system_status",
            "data": {
                "services": [{"name": "api-gateway", "status": "warning", "latency": 42}],
                "timestamp": "2024-05-01T12:00:00Z"
            }
        }"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.timestamp.is_none());
        assert_eq!(msg.kind(), "system_status");
        let ServerEvent::SystemStatus(status) = msg.event else {
            panic!("expected system_status");
        };
        assert_eq!(status.services.len(), 1);
        assert_eq!(status.services[0].status, ServiceHealth::Warning);
    }

    #[test]
    fn alert_omits_absent_optionals() {
        let event = ServerEvent::Alert(AlertEvent {
            severity: AlertSeverity::Critical,
            message: String::from("Database connection pool exhausted"),
            metric: None,
            value: None,
            threshold: None,
            timestamp: Utc::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["severity"], "critical");
        assert!(json["data"].get("threshold").is_none());
    }

    #[test]
    fn client_ping_parses_without_data() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn client_subscribe_parses_metric_list() {
        let raw = r#"{"type":"subscribe","data":{"metrics":["cpu_usage","error_rate"]}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe(SubscribeRequest {
                metrics: vec![String::from("cpu_usage"), String::from("error_rate")],
            })
        );
    }

    #[test]
    fn unknown_client_type_is_an_error() {
        let parsed = serde_json::from_str::<ClientMessage>(r#"{"type":"reboot"}"#);
        assert!(parsed.is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }
}
