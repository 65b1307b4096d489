//! Table subscriptions over the store's change feed
//!
//! `RealtimeChannels` registers handlers for row-level changes of a table.
//! Channels are keyed by `"{table}:{event}"`: subscribing twice with the same
//! key attaches the second handler to the existing channel instead of opening
//! another listener. Each subscription hands back an [`Unsubscribe`] that
//! detaches exactly that handler; a channel whose last handler leaves is
//! closed.
//!
//! ```rust,ignore
//! let channels = RealtimeChannels::new(store.change_feed());
//! let unsubscribe = channels.subscribe_to_table(
//!     TableSubscription::new(Table::AbandonedCarts, |change| {
//!         println!("{:?} on {}", change.event_type, change.table);
//!     }),
//! );
//! // later
//! unsubscribe.unsubscribe();
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::store::{ChangeEvent, ChangeFilter, Table};

/// Callback invoked for every matching change
pub type ChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

type HandlerList = Arc<RwLock<Vec<(u64, ChangeHandler)>>>;

/// A request to be told about changes to one table
#[derive(Clone)]
pub struct TableSubscription {
    pub table: Table,
    pub event: ChangeFilter,
    pub handler: ChangeHandler,
}

impl TableSubscription {
    /// Subscribe to every kind of change on `table`
    pub fn new<F>(table: Table, handler: F) -> Self
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        Self {
            table,
            event: ChangeFilter::All,
            handler: Arc::new(handler),
        }
    }

    /// Narrow the subscription to one event filter
    pub fn event(mut self, event: ChangeFilter) -> Self {
        self.event = event;
        self
    }

    fn channel_key(&self) -> String {
        format!("{}:{}", self.table, self.event)
    }
}

/// Cleanup handle returned by a subscription
#[must_use = "the subscription stays active until `unsubscribe` is called"]
pub struct Unsubscribe {
    cleanups: Vec<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cleanups: vec![Box::new(cleanup)],
        }
    }

    /// Combine several handles into one
    pub fn merge(handles: impl IntoIterator<Item = Unsubscribe>) -> Self {
        Self {
            cleanups: handles.into_iter().flat_map(|h| h.cleanups).collect(),
        }
    }

    /// Detach every handler this handle covers
    pub fn unsubscribe(self) {
        for cleanup in self.cleanups {
            cleanup();
        }
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("subscriptions", &self.cleanups.len())
            .finish()
    }
}

/// An open channel: one feed listener serving all handlers of a key
struct Channel {
    name: String,
    handlers: HandlerList,
    task: JoinHandle<()>,
}

struct ChannelsInner {
    feed: broadcast::Sender<ChangeEvent>,
    channels: Mutex<HashMap<String, Channel>>,
    next_id: AtomicU64,
}

impl ChannelsInner {
    fn channels(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn detach(&self, key: &str, handler_id: u64) {
        let mut channels = self.channels();
        let Some(channel) = channels.get(key) else {
            return;
        };

        let empty = {
            let mut handlers = channel.handlers.write().unwrap_or_else(|e| e.into_inner());
            handlers.retain(|(id, _)| *id != handler_id);
            handlers.is_empty()
        };

        if empty {
            if let Some(channel) = channels.remove(key) {
                channel.task.abort();
                tracing::debug!(channel = %channel.name, "Channel closed");
            }
        }
    }
}

/// Subscription manager over a change feed
#[derive(Clone)]
pub struct RealtimeChannels {
    inner: Arc<ChannelsInner>,
}

impl RealtimeChannels {
    pub fn new(feed: broadcast::Sender<ChangeEvent>) -> Self {
        Self {
            inner: Arc::new(ChannelsInner {
                feed,
                channels: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a handler for changes to one table
    ///
    /// Must be called from within a Tokio runtime: opening a channel spawns
    /// its listener task. Changes committed after this call returns are
    /// delivered.
    pub fn subscribe_to_table(&self, subscription: TableSubscription) -> Unsubscribe {
        let key = subscription.channel_key();
        let handler_id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut channels = self.inner.channels();
            match channels.get(&key) {
                Some(channel) => {
                    channel
                        .handlers
                        .write()
                        .unwrap_or_else(|e| e.into_inner())
                        .push((handler_id, subscription.handler));
                    tracing::debug!(channel = %channel.name, "Reusing channel");
                }
                None => {
                    let channel = self.open_channel(&subscription, handler_id);
                    tracing::debug!(channel = %channel.name, "Channel opened");
                    channels.insert(key.clone(), channel);
                }
            }
        }

        let inner = Arc::clone(&self.inner);
        Unsubscribe::new(move || inner.detach(&key, handler_id))
    }

    /// Subscribe to several tables at once; the handle undoes all of them
    pub fn subscribe_to_multiple_tables(
        &self,
        subscriptions: impl IntoIterator<Item = TableSubscription>,
    ) -> Unsubscribe {
        Unsubscribe::merge(
            subscriptions
                .into_iter()
                .map(|subscription| self.subscribe_to_table(subscription))
                .collect::<Vec<_>>(),
        )
    }

    /// Number of open channels
    pub fn channel_count(&self) -> usize {
        self.inner.channels().len()
    }

    /// Number of handlers attached to the channel for `table`/`event`
    pub fn handler_count(&self, table: Table, event: ChangeFilter) -> usize {
        let key = format!("{}:{}", table, event);
        self.inner
            .channels()
            .get(&key)
            .map(|c| c.handlers.read().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0)
    }

    /// Close every channel, dropping all handlers
    pub fn close_all(&self) {
        let mut channels = self.inner.channels();
        for (_, channel) in channels.drain() {
            channel.task.abort();
        }
    }

    fn open_channel(&self, subscription: &TableSubscription, handler_id: u64) -> Channel {
        let name = format!("public:{}:{}", subscription.table, subscription.event);
        let handlers: HandlerList = Arc::new(RwLock::new(vec![(
            handler_id,
            Arc::clone(&subscription.handler),
        )]));

        // Subscribe before spawning so nothing committed after this call is missed
        let mut rx = self.inner.feed.subscribe();
        let table = subscription.table;
        let filter = subscription.event;
        let task_handlers = Arc::clone(&handlers);
        let task_name = name.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        if change.table != table || !filter.matches(change.event_type) {
                            continue;
                        }
                        let current: Vec<ChangeHandler> = task_handlers
                            .read()
                            .unwrap_or_else(|e| e.into_inner())
                            .iter()
                            .map(|(_, handler)| Arc::clone(handler))
                            .collect();
                        for handler in current {
                            handler(&change);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(channel = %task_name, skipped, "Channel lagged, changes dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Channel {
            name,
            handlers,
            task,
        }
    }
}
