//! Registry of live viewer connections.
//!
//! Each connection is represented by the sending half of a bounded mpsc
//! queue drained by that connection's writer task. The map is guarded by
//! one async mutex: registration, removal and subscription updates lock it
//! briefly, and fan-out locks it only long enough to clone the senders,
//! then delivers outside the lock.
//!
//! Delivery is best effort. A connection whose queue is full (or already
//! closed) is skipped for that frame; nothing is retried.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use topology_types::{Connected, ConnectionId, ServerEvent, ServerMessage};
use tracing::{debug, info};

use crate::error::BroadcastError;

/// One encoded text frame, shared by every recipient.
pub type Frame = Arc<str>;

/// Greeting carried by the `connected` acknowledgement.
pub const CONNECTED_MESSAGE: &str = "Connected to live topology metrics";

/// Outcome of delivering one frame to every registered connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Connections the frame was queued for.
    pub delivered: usize,
    /// Connections skipped because their queue was full or closed.
    pub skipped: usize,
}

#[derive(Debug)]
struct ConnectionHandle {
    tx: mpsc::Sender<Frame>,
    subscriptions: Vec<String>,
}

/// Thread-safe set of open connections.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: Mutex<BTreeMap<ConnectionId, ConnectionHandle>>,
    buffer: usize,
}

impl ConnectionRegistry {
    /// Create an empty registry whose connections queue at most `buffer`
    /// frames each.
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: Mutex::new(BTreeMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a new connection and queue its `connected` acknowledgement.
    ///
    /// Returns the assigned id and the receiver the connection's writer
    /// drains. The receiver ends once the connection is removed or
    /// [`close_all`](Self::close_all) runs.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.buffer);

        let ack = ServerMessage::now(ServerEvent::Connected(Connected {
            connection_id: id,
            message: CONNECTED_MESSAGE.to_owned(),
        }));
        match encode(&ack) {
            Ok(frame) => {
                // The queue is fresh, so this only fails if buffer is zero.
                let _ = tx.try_send(frame);
            }
            Err(e) => debug!(error = %e, "failed to encode connected acknowledgement"),
        }

        let total = {
            let mut connections = self.connections.lock().await;
            connections.insert(
                id,
                ConnectionHandle {
                    tx,
                    subscriptions: Vec::new(),
                },
            );
            connections.len()
        };
        info!(connection_id = %id, total, "connection registered");
        (id, rx)
    }

    /// Remove a connection. Returns whether it was present.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        let (removed, total) = {
            let mut connections = self.connections.lock().await;
            let removed = connections.remove(&id).is_some();
            (removed, connections.len())
        };
        if removed {
            info!(connection_id = %id, total, "connection removed");
        }
        removed
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Whether no connections are registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// Record the measurements a connection subscribed to.
    ///
    /// Subscriptions are advisory: fan-out ignores them.
    pub async fn set_subscriptions(&self, id: ConnectionId, metrics: Vec<String>) -> bool {
        let mut connections = self.connections.lock().await;
        connections.get_mut(&id).is_some_and(|handle| {
            handle.subscriptions = metrics;
            true
        })
    }

    /// Measurements a connection last subscribed to.
    pub async fn subscriptions(&self, id: ConnectionId) -> Option<Vec<String>> {
        let connections = self.connections.lock().await;
        connections.get(&id).map(|h| h.subscriptions.clone())
    }

    /// Queue a message for one connection. Returns whether it was queued.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::Encode`] if the message cannot be encoded.
    pub async fn send_to(
        &self,
        id: ConnectionId,
        message: &ServerMessage,
    ) -> Result<bool, BroadcastError> {
        let frame = encode(message)?;
        let tx = {
            let connections = self.connections.lock().await;
            connections.get(&id).map(|h| h.tx.clone())
        };
        Ok(tx.is_some_and(|tx| tx.try_send(frame).is_ok()))
    }

    /// Encode a message once and fan it out to every connection.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::Encode`] if the message cannot be encoded.
    pub async fn broadcast(&self, message: &ServerMessage) -> Result<FanOutReport, BroadcastError> {
        let frame = encode(message)?;
        Ok(self.fan_out(&frame).await)
    }

    /// Queue an already-encoded frame for every connection.
    pub async fn fan_out(&self, frame: &Frame) -> FanOutReport {
        let recipients: Vec<(ConnectionId, mpsc::Sender<Frame>)> = {
            let connections = self.connections.lock().await;
            connections
                .iter()
                .map(|(id, handle)| (*id, handle.tx.clone()))
                .collect()
        };

        let mut report = FanOutReport::default();
        for (id, tx) in recipients {
            match tx.try_send(Arc::clone(frame)) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    debug!(connection_id = %id, "outbound queue full, skipping");
                    report.skipped = report.skipped.saturating_add(1);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection_id = %id, "connection closing, skipping");
                    report.skipped = report.skipped.saturating_add(1);
                }
            }
        }
        report
    }

    /// Drop every connection's queue so each writer sends a close frame
    /// and exits. Returns how many connections were closed.
    pub async fn close_all(&self) -> usize {
        let closed = {
            let mut connections = self.connections.lock().await;
            let count = connections.len();
            connections.clear();
            count
        };
        info!(closed, "all connections closed");
        closed
    }
}

/// Serialize a message into a shareable text frame.
///
/// # Errors
///
/// Returns [`BroadcastError::Encode`] if serialization fails.
pub fn encode(message: &ServerMessage) -> Result<Frame, BroadcastError> {
    Ok(Arc::from(serde_json::to_string(message)?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;
    use topology_types::{Pong, SystemStatus};

    use super::*;

    fn status_message() -> ServerMessage {
        ServerMessage::now(ServerEvent::SystemStatus(SystemStatus {
            services: Vec::new(),
            timestamp: Utc::now(),
        }))
    }

    #[tokio::test]
    async fn register_queues_connected_ack_first() {
        let registry = ConnectionRegistry::new(4);
        let (id, mut rx) = registry.register().await;

        let frame = rx.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["data"]["connection_id"], id.to_string());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn remove_ends_the_receiver() {
        let registry = ConnectionRegistry::new(4);
        let (id, mut rx) = registry.register().await;
        let _ack = rx.recv().await;

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(rx.recv().await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn full_queue_is_skipped_not_blocked() {
        let registry = ConnectionRegistry::new(1);
        // The ack fills the single slot.
        let (_id, _rx) = registry.register().await;

        let report = registry.broadcast(&status_message()).await.unwrap();
        assert_eq!(report, FanOutReport { delivered: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn subscriptions_are_recorded_per_connection() {
        let registry = ConnectionRegistry::new(4);
        let (a, _rx_a) = registry.register().await;
        let (b, _rx_b) = registry.register().await;

        assert!(registry.set_subscriptions(a, vec![String::from("cpu_usage")]).await);
        assert_eq!(registry.subscriptions(a).await, Some(vec![String::from("cpu_usage")]));
        assert_eq!(registry.subscriptions(b).await, Some(Vec::new()));
        assert!(!registry.set_subscriptions(ConnectionId::new(), Vec::new()).await);
    }

    #[tokio::test]
    async fn send_to_targets_one_connection() {
        let registry = ConnectionRegistry::new(4);
        let (a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;
        let _ = (rx_a.recv().await, rx_b.recv().await);

        let pong = ServerMessage::now(ServerEvent::Pong(Pong { timestamp: Utc::now() }));
        assert!(registry.send_to(a, &pong).await.unwrap());

        let frame = rx_a.recv().await.unwrap();
        assert!(frame.contains("\"pong\""));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_all_empties_registry() {
        let registry = ConnectionRegistry::new(4);
        let (_a, mut rx_a) = registry.register().await;
        let (_b, _rx_b) = registry.register().await;

        assert_eq!(registry.close_all().await, 2);
        assert!(registry.is_empty().await);
        let _ack = rx_a.recv().await;
        assert!(rx_a.recv().await.is_none());
    }
}
