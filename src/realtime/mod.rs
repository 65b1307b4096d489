//! Realtime Updates
//!
//! Pushes row-level store changes and user notices to dashboards.
//!
//! ## Architecture
//!
//! - **RealtimeChannels**: Table subscriptions over the store's change feed,
//!   deduplicated by `table:event`
//! - **ConnectionHub**: Manages WebSocket connections and topic subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Client and server message formats
//!
//! ## Topics
//!
//! - `{table}.insert`, `{table}.update`, `{table}.delete` - Row changes
//! - `{table}.*` - Every change on a table
//! - `notifications` - Transient user-facing notices
//! - `system` - Server lifecycle events
//!
//! `{"type": "watch", "tables": [...]}` subscribes to `{table}.*` for each
//! named table. Unknown topics and tables come back in the `rejected` list
//! of the `subscribed` reply.
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/api/v1/realtime');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['abandoned_carts.*', 'notifications']}));
//! };
//! ```

mod channels;
mod handler;
mod hub;
mod messages;

pub use channels::{ChangeHandler, RealtimeChannels, TableSubscription, Unsubscribe};
pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError, TopicChanges};
pub use messages::{ClientMessage, RealtimeEvent, ServerMessage, NOTIFICATIONS_TOPIC, SYSTEM_TOPIC};

use std::sync::Arc;

use crate::store::Table;

/// Relay every store change to WebSocket subscribers of its topic
pub fn relay_changes(channels: &RealtimeChannels, hub: Arc<ConnectionHub>) -> Unsubscribe {
    channels.subscribe_to_multiple_tables(Table::all().iter().map(|table| {
        let hub = Arc::clone(&hub);
        TableSubscription::new(*table, move |change| {
            hub.publish(RealtimeEvent::change(change));
        })
    }))
}
