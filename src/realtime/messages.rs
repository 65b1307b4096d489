//! Realtime Message Types
//!
//! Defines all message types for WebSocket communication between
//! dashboards and the cartback server.

use serde::{Deserialize, Serialize};

use crate::services::{Notice, NoticeVariant};
use crate::store::ChangeEvent;

/// Topic carrying transient user-facing notices
pub const NOTIFICATIONS_TOPIC: &str = "notifications";

/// Topic carrying server lifecycle messages
pub const SYSTEM_TOPIC: &str = "system";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// Topics such as "abandoned_carts.insert" or "recovery_campaigns.*"
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Follow every change on the named tables (`{table}.*`)
    Watch { tables: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A row changed in the store
    Change {
        /// Topic the change was published on
        topic: String,
        payload: ChangeEvent,
    },
    /// A transient notice for the user
    Notice {
        title: String,
        description: String,
        variant: NoticeVariant,
    },
    /// Server lifecycle message
    System { message: String },
    /// Subscription confirmed
    Subscribed {
        topics: Vec<String>,
        /// Requested topics that do not exist
        #[serde(skip_serializing_if = "Vec::is_empty")]
        rejected: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
    /// Connection established
    Connected { connection_id: String },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    /// Topic this event belongs to (e.g., "abandoned_carts.update")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl RealtimeEvent {
    /// Topic for a table and change kind
    pub fn change_topic(change: &ChangeEvent) -> String {
        format!("{}.{}", change.table, change.event_type.as_str())
    }

    /// Create a change event from a store notification
    pub fn change(change: &ChangeEvent) -> Self {
        let topic = Self::change_topic(change);
        Self {
            message: ServerMessage::Change {
                topic: topic.clone(),
                payload: change.clone(),
            },
            topic,
        }
    }

    /// Create a notice event
    pub fn notice(notice: &Notice) -> Self {
        Self {
            topic: NOTIFICATIONS_TOPIC.to_string(),
            message: ServerMessage::Notice {
                title: notice.title.clone(),
                description: notice.description.clone(),
                variant: notice.variant,
            },
        }
    }

    /// Create a system event
    pub fn system(message: &str) -> Self {
        Self {
            topic: SYSTEM_TOPIC.to_string(),
            message: ServerMessage::System {
                message: message.to_string(),
            },
        }
    }
}
