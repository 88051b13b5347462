//! `WebSocket` handler for the live metrics stream.
//!
//! Each connection is split in two. A writer task drains the connection's
//! registry queue into the socket and sends a close frame when the queue
//! ends. The handler task reads client frames: `ping` is answered with
//! `pong`, `subscribe` is recorded, and anything else is logged and
//! ignored. Whichever side finishes first ends the connection, and the
//! connection is always removed from the registry on the way out.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use topology_types::{ClientMessage, ConnectionId, Pong, ServerEvent, ServerMessage};
use tracing::{debug, warn};

use crate::registry::Frame;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming broadcast events.
///
/// # Route
///
/// `GET {ws_path}` (default `/ws/metrics`)
pub async fn ws_metrics(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// What the reader should do with one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Answer with `pong`.
    Ping,
    /// Record the subscription list.
    Subscribe(Vec<String>),
    /// Nothing to do.
    Ignore,
    /// The peer is going away.
    Close,
}

/// Classify one inbound frame. Malformed text is logged and ignored.
pub fn classify(connection_id: ConnectionId, message: &Message) -> Inbound {
    match message {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(ClientMessage::Ping) => Inbound::Ping,
            Ok(ClientMessage::Subscribe(request)) => Inbound::Subscribe(request.metrics),
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "ignoring malformed client message"
                );
                Inbound::Ignore
            }
        },
        Message::Binary(_) => {
            warn!(connection_id = %connection_id, "ignoring binary client frame");
            Inbound::Ignore
        }
        Message::Close(_) => Inbound::Close,
        // Protocol-level ping/pong is answered by the socket itself.
        Message::Ping(_) | Message::Pong(_) => Inbound::Ignore,
    }
}

async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let (sink, mut stream) = socket.split();
    let (id, rx) = state.registry.register().await;
    let mut writer = tokio::spawn(write_frames(sink, rx, id));
    let mut writer_done = false;

    loop {
        tokio::select! {
            _ = &mut writer => {
                writer_done = true;
                break;
            }
            inbound = stream.next() => {
                let message = match inbound {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        debug!(connection_id = %id, error = %e, "WebSocket read error");
                        break;
                    }
                    None => break,
                };
                match classify(id, &message) {
                    Inbound::Ping => {
                        let pong = ServerMessage::now(ServerEvent::Pong(Pong {
                            timestamp: Utc::now(),
                        }));
                        if let Err(e) = state.registry.send_to(id, &pong).await {
                            warn!(connection_id = %id, error = %e, "failed to queue pong");
                        }
                    }
                    Inbound::Subscribe(metrics) => {
                        debug!(connection_id = %id, metrics = ?metrics, "client subscribed");
                        state.registry.set_subscriptions(id, metrics).await;
                    }
                    Inbound::Ignore => {}
                    Inbound::Close => break,
                }
            }
        }
    }

    state.registry.remove(id).await;
    if !writer_done {
        // Removing the connection dropped its queue; the writer now sends
        // a close frame and exits.
        if let Err(e) = writer.await {
            debug!(connection_id = %id, error = %e, "writer task ended abnormally");
        }
    }
    debug!(connection_id = %id, "WebSocket handler finished");
}

/// Forward queued frames until the queue closes or the socket fails.
async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Frame>,
    id: ConnectionId,
) {
    while let Some(frame) = rx.recv().await {
        if sink.send(Message::Text(frame.as_ref().into())).await.is_err() {
            debug!(connection_id = %id, "WebSocket client disconnected (send failed)");
            return;
        }
    }
    let close = Message::Close(Some(CloseFrame {
        code: close_code::AWAY,
        reason: "server shutting down".into(),
    }));
    let _ = sink.send(close).await;
    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(raw: &str) -> Message {
        Message::Text(raw.into())
    }

    #[test]
    fn ping_and_subscribe_are_recognised() {
        let id = ConnectionId::new();
        assert_eq!(classify(id, &text(r#"{"type":"ping"}"#)), Inbound::Ping);
        assert_eq!(
            classify(id, &text(r#"{"type":"subscribe","data":{"metrics":["cpu_usage"]}}"#)),
            Inbound::Subscribe(vec![String::from("cpu_usage")])
        );
    }

    #[test]
    fn garbage_is_ignored() {
        let id = ConnectionId::new();
        assert_eq!(classify(id, &text("{not json")), Inbound::Ignore);
        assert_eq!(classify(id, &text(r#"{"type":"shutdown"}"#)), Inbound::Ignore);
        assert_eq!(classify(id, &Message::Binary(vec![1, 2, 3].into())), Inbound::Ignore);
    }

    #[test]
    fn close_frame_ends_the_connection() {
        assert_eq!(classify(ConnectionId::new(), &Message::Close(None)), Inbound::Close);
    }
}
