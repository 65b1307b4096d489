//! WebSocket Handler
//!
//! Upgrades `/api/v1/realtime` requests and runs one session per socket.
//! A session interleaves hub traffic for the connection with replies to
//! client frames on a single writer, so nothing is sent concurrently.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::{ConnectionHub, TopicChanges};
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;
use crate::store::Table;

/// GET /api/v1/realtime
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| run_session(socket, hub))
}

/// What to do with the socket after a client frame
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Close,
}

async fn write<S>(sink: &mut S, message: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            return true;
        }
    };
    sink.send(Message::Text(text)).await.is_ok()
}

async fn run_session(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut outbox) = mpsc::unbounded_channel::<ServerMessage>();

    let id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected WebSocket connection");
            write(&mut sink, &ServerMessage::Error { message: e.to_string() }).await;
            return;
        }
    };

    let connected = ServerMessage::Connected {
        connection_id: id.clone(),
    };
    if write(&mut sink, &connected).await {
        loop {
            tokio::select! {
                outgoing = outbox.recv() => {
                    let Some(message) = outgoing else { break };
                    if !write(&mut sink, &message).await {
                        tracing::debug!(connection_id = %id, "WebSocket send failed");
                        break;
                    }
                }
                incoming = stream.next() => {
                    let frame = match incoming {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => {
                            tracing::debug!(connection_id = %id, error = %e, "WebSocket receive error");
                            break;
                        }
                        None => break,
                    };
                    let (reply, flow) = handle_frame(&hub, &id, frame).await;
                    if let Some(reply) = reply {
                        if !write(&mut sink, &reply).await {
                            break;
                        }
                    }
                    if flow == Flow::Close {
                        break;
                    }
                }
            }
        }
    }

    hub.unregister(&id).await;
}

/// Answer one client frame
async fn handle_frame(
    hub: &ConnectionHub,
    connection_id: &str,
    frame: Message,
) -> (Option<ServerMessage>, Flow) {
    match frame {
        Message::Text(text) => {
            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => handle_client_message(hub, connection_id, message).await,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Invalid client message");
                    ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    }
                }
            };
            (Some(reply), Flow::Continue)
        }
        Message::Binary(_) => (
            Some(ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            }),
            Flow::Continue,
        ),
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => (None, Flow::Continue),
        Message::Close(_) => (None, Flow::Close),
    }
}

async fn handle_client_message(
    hub: &ConnectionHub,
    connection_id: &str,
    message: ClientMessage,
) -> ServerMessage {
    let result = match message {
        ClientMessage::Subscribe { topics } => hub
            .subscribe(connection_id, topics)
            .await
            .map(subscribed),
        ClientMessage::Watch { tables } => {
            let (topics, unknown) = table_topics(tables);
            hub.subscribe(connection_id, topics).await.map(|mut changes| {
                changes.rejected.extend(unknown);
                subscribed(changes)
            })
        }
        ClientMessage::Unsubscribe { topics } => hub
            .unsubscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Unsubscribed { topics }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e| {
        tracing::error!(connection_id = %connection_id, error = %e, "Subscription error");
        ServerMessage::Error {
            message: e.to_string(),
        }
    })
}

fn subscribed(changes: TopicChanges) -> ServerMessage {
    ServerMessage::Subscribed {
        topics: changes.accepted,
        rejected: changes.rejected,
    }
}

/// Split table names into `{table}.*` topics and unknown names
fn table_topics(tables: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut topics = Vec::new();
    let mut unknown = Vec::new();
    for name in tables {
        match Table::from_str(&name) {
            Ok(table) => topics.push(format!("{}.*", table)),
            Err(_) => unknown.push(name),
        }
    }
    (topics, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::hub::HubConfig;
    use crate::realtime::messages::RealtimeEvent;
    use crate::store::ChangeEvent;

    async fn connected_hub() -> (ConnectionHub, String, mpsc::UnboundedReceiver<ServerMessage>) {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        (hub, id, rx)
    }

    async fn send_text(hub: &ConnectionHub, id: &str, text: &str) -> ServerMessage {
        let (reply, flow) = handle_frame(hub, id, Message::Text(text.to_string())).await;
        assert_eq!(flow, Flow::Continue);
        reply.expect("text frames always get a reply")
    }

    #[tokio::test]
    async fn test_subscribe_reports_rejected_topics() {
        let (hub, id, _rx) = connected_hub().await;

        let reply = send_text(
            &hub,
            &id,
            r#"{"type":"subscribe","topics":["abandoned_carts.insert","orders.insert"]}"#,
        )
        .await;

        match reply {
            ServerMessage::Subscribed { topics, rejected } => {
                assert_eq!(topics, ["abandoned_carts.insert"]);
                assert_eq!(rejected, ["orders.insert"]);
            }
            other => panic!("Expected Subscribed, got {:?}", other),
        }
        assert_eq!(hub.subscription_count("abandoned_carts.insert").await, 1);
    }

    #[tokio::test]
    async fn test_watch_follows_whole_tables() {
        let (hub, id, mut rx) = connected_hub().await;

        let reply = send_text(
            &hub,
            &id,
            r#"{"type":"watch","tables":["recovery_campaigns","orders"]}"#,
        )
        .await;

        match reply {
            ServerMessage::Subscribed { topics, rejected } => {
                assert_eq!(topics, ["recovery_campaigns.*"]);
                assert_eq!(rejected, ["orders"]);
            }
            other => panic!("Expected Subscribed, got {:?}", other),
        }

        let change = ChangeEvent::insert(Table::RecoveryCampaigns, serde_json::json!({"id": "c1"}));
        hub.broadcast(&RealtimeEvent::change(&change)).await;
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Change { .. })));
    }

    #[tokio::test]
    async fn test_unsubscribe_lists_removed_topics() {
        let (hub, id, _rx) = connected_hub().await;
        send_text(&hub, &id, r#"{"type":"subscribe","topics":["notifications"]}"#).await;

        let reply = send_text(
            &hub,
            &id,
            r#"{"type":"unsubscribe","topics":["notifications","system"]}"#,
        )
        .await;

        assert!(matches!(reply, ServerMessage::Unsubscribed { topics } if topics == ["notifications"]));
        assert_eq!(hub.subscription_count("notifications").await, 0);
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let (hub, id, _rx) = connected_hub().await;
        let reply = send_text(&hub, &id, r#"{"type":"ping"}"#).await;
        assert!(matches!(reply, ServerMessage::Pong));
    }

    #[tokio::test]
    async fn test_invalid_json_keeps_connection_open() {
        let (hub, id, _rx) = connected_hub().await;

        let reply = send_text(&hub, &id, "{not json").await;

        match reply {
            ServerMessage::Error { message } => assert!(message.starts_with("Invalid message format")),
            other => panic!("Expected Error, got {:?}", other),
        }
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_binary_and_control_frames() {
        let (hub, id, _rx) = connected_hub().await;

        let (reply, flow) = handle_frame(&hub, &id, Message::Binary(vec![1, 2, 3])).await;
        assert!(matches!(reply, Some(ServerMessage::Error { .. })));
        assert_eq!(flow, Flow::Continue);

        let (reply, flow) = handle_frame(&hub, &id, Message::Ping(vec![])).await;
        assert!(reply.is_none());
        assert_eq!(flow, Flow::Continue);

        let (reply, flow) = handle_frame(&hub, &id, Message::Close(None)).await;
        assert!(reply.is_none());
        assert_eq!(flow, Flow::Close);
    }

    #[tokio::test]
    async fn test_unknown_connection_gets_error() {
        let hub = ConnectionHub::new(HubConfig::default());

        let reply = send_text(&hub, "missing", r#"{"type":"subscribe","topics":["system"]}"#).await;

        match reply {
            ServerMessage::Error { message } => assert_eq!(message, "Connection not found"),
            other => panic!("Expected Error, got {:?}", other),
        }
    }
}
