//! WebSocket Connection Hub
//!
//! Manages all WebSocket connections, topic subscriptions, and message
//! fan-out to dashboards.
//!
//! Connections and topics live behind a single lock. Events handed to
//! [`ConnectionHub::publish`] go through one queue drained by one task, so
//! subscribers see them in publish order.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{RealtimeEvent, ServerMessage, NOTIFICATIONS_TOPIC, SYSTEM_TOPIC};
use crate::services::{Notice, Notifier};
use crate::store::{ChangeFilter, Table};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    registry: Arc<RwLock<Registry>>,
    /// Ordered publish queue
    outbox: mpsc::UnboundedSender<RealtimeEvent>,
    /// Queue receiver, until the dispatcher task takes it
    pending: Mutex<Option<mpsc::UnboundedReceiver<RealtimeEvent>>>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    pub subscriptions: HashSet<String>,
}

/// Outcome of a subscribe request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicChanges {
    pub accepted: Vec<String>,
    /// Topics that name no table, change kind or channel
    pub rejected: Vec<String>,
}

/// Connection and topic tables
#[derive(Default)]
struct Registry {
    /// ConnectionId → ConnectionHandle
    connections: HashMap<ConnectionId, ConnectionHandle>,
    /// Topic → ConnectionIds
    subscriptions: HashMap<String, HashSet<ConnectionId>>,
}

impl Registry {
    fn deliver(&self, event: &RealtimeEvent) -> usize {
        let direct = self.subscriptions.get(&event.topic);

        // "abandoned_carts.*" matches "abandoned_carts.update"
        let wildcard = event
            .topic
            .split_once('.')
            .and_then(|(table, _)| self.subscriptions.get(&format!("{}.*", table)));

        let ids: HashSet<&ConnectionId> = direct
            .into_iter()
            .chain(wildcard)
            .flat_map(|set| set.iter())
            .collect();

        ids.into_iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|handle| handle.sender.send(event.message.clone()).is_ok())
            .count()
    }

    fn drop_subscriber(&mut self, topic: &str, id: &str) {
        if let Some(subscribers) = self.subscriptions.get_mut(topic) {
            subscribers.remove(id);
            if subscribers.is_empty() {
                self.subscriptions.remove(topic);
            }
        }
    }
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        let (outbox, pending) = mpsc::unbounded_channel();
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            outbox,
            pending: Mutex::new(Some(pending)),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID, or an error if the connection limit has
    /// been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut registry = self.registry.write().await;
        if registry.connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        registry.connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let mut registry = self.registry.write().await;
        if let Some(handle) = registry.connections.remove(id) {
            for topic in &handle.subscriptions {
                registry.drop_subscriber(topic, id);
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics
    ///
    /// Invalid topics are returned in [`TopicChanges::rejected`] and leave
    /// the connection's other subscriptions untouched.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<TopicChanges, HubError> {
        let mut guard = self.registry.write().await;
        let registry = &mut *guard;
        let handle = registry
            .connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut changes = TopicChanges::default();
        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(connection_id = %id, topic = %topic, "Invalid topic rejected");
                changes.rejected.push(topic);
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            registry
                .subscriptions
                .entry(topic.clone())
                .or_default()
                .insert(id.to_string());
            changes.accepted.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?changes.accepted, "Subscribed to topics");
        Ok(changes)
    }

    /// Unsubscribe a connection from topics it holds
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut registry = self.registry.write().await;
        let handle = registry
            .connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let removed: Vec<String> = topics
            .into_iter()
            .filter(|topic| handle.subscriptions.remove(topic))
            .collect();
        for topic in &removed {
            registry.drop_subscriber(topic, id);
        }

        tracing::debug!(connection_id = %id, topics = ?removed, "Unsubscribed from topics");
        Ok(removed)
    }

    /// Deliver an event to every subscriber of its topic (direct or wildcard)
    pub async fn broadcast(&self, event: &RealtimeEvent) {
        let sent = self.registry.read().await.deliver(event);
        if sent > 0 {
            tracing::trace!(topic = %event.topic, subscribers = sent, "Broadcast event");
        }
    }

    /// Queue an event from a synchronous context
    ///
    /// Queued events are delivered in order by a single dispatcher task,
    /// started on first use. Must be called from within a Tokio runtime.
    pub fn publish(&self, event: RealtimeEvent) {
        self.start_dispatcher();
        if self.outbox.send(event).is_err() {
            tracing::warn!("Realtime dispatcher stopped, event dropped");
        }
    }

    fn start_dispatcher(&self) {
        let receiver = match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(mut receiver) = receiver else {
            return;
        };

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                registry.read().await.deliver(&event);
            }
        });
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let registry = self.registry.read().await;
        let handle = registry
            .connections
            .get(id)
            .ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.registry
            .read()
            .await
            .subscriptions
            .get(topic)
            .map_or(0, HashSet::len)
    }
}

impl Notifier for ConnectionHub {
    fn notify(&self, notice: Notice) {
        self.publish(RealtimeEvent::notice(&notice));
    }
}

/// Valid topics:
/// - `{table}.{insert|update|delete}` and `{table}.*`
/// - `notifications`
/// - `system`
fn is_valid_topic(topic: &str) -> bool {
    if topic == NOTIFICATIONS_TOPIC || topic == SYSTEM_TOPIC {
        return true;
    }

    match topic.split_once('.') {
        Some((table, event)) => {
            Table::from_str(table).is_ok()
                && (event == "*"
                    || matches!(ChangeFilter::from_str(event), Ok(ChangeFilter::Only(_))))
        }
        None => false,
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChangeEvent;

    fn cart_insert() -> RealtimeEvent {
        RealtimeEvent::change(&ChangeEvent::insert(
            Table::AbandonedCarts,
            serde_json::json!({"id": "1"}),
        ))
    }

    #[test]
    fn test_default_config() {
        assert_eq!(HubConfig::default().max_connections, 1000);
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("abandoned_carts.insert"));
        assert!(is_valid_topic("abandoned_carts.*"));
        assert!(is_valid_topic("recovery_campaigns.update"));
        assert!(is_valid_topic("subscriptions.delete"));
        assert!(is_valid_topic("notifications"));
        assert!(is_valid_topic("system"));

        assert!(!is_valid_topic("invalid"));
        assert!(!is_valid_topic(""));
        assert!(!is_valid_topic("orders.insert"));
        assert!(!is_valid_topic("abandoned_carts.upsert"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["abandoned_carts.insert".to_string(), "bogus".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed.accepted, vec!["abandoned_carts.insert"]);
        assert_eq!(subscribed.rejected, vec!["bogus"]);
        assert_eq!(hub.subscription_count("abandoned_carts.insert").await, 1);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["abandoned_carts.insert".to_string()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["abandoned_carts.insert"]);
        assert_eq!(hub.subscription_count("abandoned_carts.insert").await, 0);

        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 2 });

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_broadcast_to_subscribers() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        hub.subscribe(&id1, vec!["abandoned_carts.insert".to_string()])
            .await
            .unwrap();
        hub.subscribe(&id2, vec!["recovery_campaigns.insert".to_string()])
            .await
            .unwrap();

        hub.broadcast(&cart_insert()).await;

        assert!(matches!(rx1.try_recv(), Ok(ServerMessage::Change { .. })));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_subscription() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(&id, vec!["abandoned_carts.*".to_string()])
            .await
            .unwrap();

        hub.broadcast(&cart_insert()).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_direct_and_wildcard_deliver_once() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(
            &id,
            vec![
                "abandoned_carts.*".to_string(),
                "abandoned_carts.insert".to_string(),
            ],
        )
        .await
        .unwrap();

        hub.broadcast(&cart_insert()).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notifier_publishes_notices() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec![NOTIFICATIONS_TOPIC.to_string()])
            .await
            .unwrap();

        hub.notify(Notice::success("Cart saved", "Abandoned cart has been logged successfully"));

        let msg = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match msg {
            ServerMessage::Notice { title, .. } => assert_eq!(title, "Cart saved"),
            other => panic!("Expected Notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_preserves_order() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["abandoned_carts.*".to_string()])
            .await
            .unwrap();

        const COUNT: u64 = 2000;
        for i in 0..COUNT {
            let change = ChangeEvent::insert(Table::AbandonedCarts, serde_json::json!({ "i": i }));
            hub.publish(RealtimeEvent::change(&change));
        }

        for expected in 0..COUNT {
            let msg = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            match msg {
                ServerMessage::Change { payload, .. } => {
                    assert_eq!(payload.new["i"], expected);
                }
                other => panic!("Expected Change, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_notice_follows_change_it_reports() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(
            &id,
            vec!["abandoned_carts.*".to_string(), NOTIFICATIONS_TOPIC.to_string()],
        )
        .await
        .unwrap();

        hub.publish(cart_insert());
        hub.notify(Notice::success("Cart saved", "Abandoned cart has been logged successfully"));

        assert!(matches!(rx.recv().await, Some(ServerMessage::Change { .. })));
        assert!(matches!(rx.recv().await, Some(ServerMessage::Notice { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_broadcast_during_subscription_churn() {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["abandoned_carts.*".to_string()])
            .await
            .unwrap();

        let broadcaster = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for _ in 0..5000 {
                    hub.broadcast(&cart_insert()).await;
                    hub.publish(cart_insert());
                }
            })
        };
        let churner = {
            let hub = Arc::clone(&hub);
            let id = id.clone();
            tokio::spawn(async move {
                for _ in 0..5000 {
                    hub.subscribe(&id, vec![NOTIFICATIONS_TOPIC.to_string()])
                        .await
                        .unwrap();
                    hub.unsubscribe(&id, vec![NOTIFICATIONS_TOPIC.to_string()])
                        .await
                        .unwrap();
                    let (extra, _) = mpsc::unbounded_channel();
                    let extra = hub.register(extra).await.unwrap();
                    hub.unregister(&extra).await;
                }
            })
        };

        tokio::time::timeout(std::time::Duration::from_secs(30), async {
            broadcaster.await.unwrap();
            churner.await.unwrap();
        })
        .await
        .expect("hub stalled under concurrent broadcast and subscribe");

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert!(received >= 5000);
        assert_eq!(hub.connection_count().await, 1);
    }
}
