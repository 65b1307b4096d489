//! # Cartback
//!
//! Cart-abandonment recovery backend - stores abandoned carts and recovery
//! campaigns, derives dashboard analytics, pushes realtime updates, and
//! serves the payment and recovery-email function endpoints.
//!
//! ## Features
//!
//! - **Relational store**: SQLite tables with a row-level change feed
//! - **Realtime**: Deduplicated table subscriptions relayed over WebSocket
//! - **Services**: Cart and campaign operations with user-facing notices
//! - **Analytics**: Stat cards, trends, funnels, experiments, discounts, feedback
//! - **Functions**: Payment processing and recovery emails with JSON envelopes
//!
//! ## Modules
//!
//! - [`store`]: SQLite store and change feed
//! - [`realtime`]: Table subscriptions and the WebSocket hub
//! - [`services`]: Cart and campaign services, notices
//! - [`analytics`]: Dashboard read models
//! - [`functions`]: `/functions/v1` endpoints
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartback::services::{CartService, NoopNotifier};
//! use cartback::store::{CartFilter, Store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Store::open_in_memory()?);
//!     let carts = CartService::new(store, Arc::new(NoopNotifier));
//!
//!     carts.generate_demo_carts(20).await?;
//!     let recovered = carts
//!         .get_abandoned_carts(&CartFilter { recovered: Some(true), ..Default::default() })
//!         .await?;
//!
//!     println!("{} recovered carts", recovered.len());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod demo;
pub mod functions;
pub mod realtime;
pub mod services;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    AbandonedCart, CampaignStatus, CartFilter, CartItem, ChangeEvent, NewAbandonedCart,
    NewRecoveryCampaign, RecoveryCampaign, Store, StoreConfig, StoreError, StoreResult, Table,
};

pub use services::{CampaignService, CartService, Notice, Notifier, ServiceError};

pub use realtime::{ConnectionHub, RealtimeChannels, TableSubscription, Unsubscribe};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError};
