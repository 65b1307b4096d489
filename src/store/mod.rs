//! Cartback Store
//!
//! Relational storage for the recovery dashboard:
//!
//! - **types**: Record types (AbandonedCart, RecoveryCampaign, Subscription)
//! - **changes**: Change feed payloads (ChangeEvent, Table, ChangeFilter)
//! - **db**: SQLite-backed store with select/insert/update and a change feed
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use cartback::store::{CartFilter, CartItem, NewAbandonedCart, Store, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open(&StoreConfig::file("./cartback.db"))?;
//!
//!     let cart = NewAbandonedCart::new(
//!         "alex@example.com",
//!         vec![CartItem::new("p3", "Smart Home Speaker", 129.99, 1)],
//!     );
//!     store.insert_carts(vec![cart]).await?;
//!
//!     let carts = store.list_carts(&CartFilter::default()).await?;
//!     println!("{} abandoned carts", carts.len());
//!     Ok(())
//! }
//! ```

pub mod changes;
pub mod db;
pub mod error;
pub mod types;

pub use changes::{ChangeEvent, ChangeFilter, ChangeKind, Table};
pub use db::{Store, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use types::{
    AbandonedCart, CampaignStatus, CartFilter, CartItem, CartPatch, NewAbandonedCart,
    NewRecoveryCampaign, NewSubscription, RecoveryCampaign, RecoveryStatus, Subscription,
};
