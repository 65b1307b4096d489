//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::analytics::{DiscountBook, FeedbackBoard};
use crate::config::Config;
use crate::functions::FunctionsState;
use crate::realtime::{relay_changes, ConnectionHub, RealtimeChannels, Unsubscribe};
use crate::services::{CampaignService, CartService, Notifier};
use crate::store::Store;

/// Shared application state for all handlers
pub struct AppState {
    /// Relational store for carts, campaigns and subscriptions
    pub store: Arc<Store>,
    pub carts: CartService,
    pub campaigns: CampaignService,
    /// WebSocket connection hub; also the notice sink for every service
    pub hub: Arc<ConnectionHub>,
    /// Table subscriptions over the store's change feed
    pub channels: RealtimeChannels,
    pub discounts: DiscountBook,
    pub feedback: FeedbackBoard,
    /// Dependencies of the `/functions/v1` endpoints
    pub functions: Arc<FunctionsState>,
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    relay: Mutex<Option<Unsubscribe>>,
}

impl AppState {
    /// Wire services to `store` and start relaying its changes to the hub
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(store: Arc<Store>, config: Config) -> Self {
        let hub = Arc::new(ConnectionHub::new(config.realtime.hub_config()));
        let notifier: Arc<dyn Notifier> = hub.clone();

        let channels = RealtimeChannels::new(store.change_feed());
        let relay = relay_changes(&channels, Arc::clone(&hub));

        let mut functions = FunctionsState::simulated(Arc::clone(&store));
        functions.subscription_days = config.functions.subscription_days;

        Self {
            carts: CartService::new(Arc::clone(&store), Arc::clone(&notifier)),
            campaigns: CampaignService::new(Arc::clone(&store), Arc::clone(&notifier)),
            discounts: DiscountBook::new(Arc::clone(&notifier)),
            feedback: FeedbackBoard::seeded(notifier),
            functions: Arc::new(functions),
            store,
            hub,
            channels,
            config: Arc::new(config),
            start_time: Instant::now(),
            relay: Mutex::new(Some(relay)),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }

    /// Stop relaying store changes and close every table channel
    pub fn shutdown(&self) {
        let relay = self
            .relay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(relay) = relay {
            relay.unsubscribe();
        }
        self.channels.close_all();
    }
}
