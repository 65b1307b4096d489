//! SQLite-backed store for carts, campaigns and subscriptions
//!
//! One connection guarded by an async mutex. Every call is a single
//! statement or a short transaction: select with equality filters and
//! ordering, insert-then-select, or a single-row update. Successful writes
//! are published on the change feed after commit.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::changes::{ChangeEvent, Table};
use super::error::{StoreError, StoreResult};
use super::types::{
    AbandonedCart, CampaignStatus, CartFilter, CartPatch, NewAbandonedCart, NewRecoveryCampaign,
    NewSubscription, RecoveryCampaign, Subscription,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS abandoned_carts (
        id TEXT PRIMARY KEY,
        user_email TEXT NOT NULL,
        cart_value REAL NOT NULL,
        items TEXT NOT NULL,
        abandoned_at TEXT NOT NULL,
        recovered INTEGER NOT NULL DEFAULT 0,
        recovery_email_sent INTEGER NOT NULL DEFAULT 0,
        recovery_email_sent_at TEXT,
        recovery_email_opened INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_carts_abandoned_at ON abandoned_carts(abandoned_at);

    CREATE TABLE IF NOT EXISTS recovery_campaigns (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        channels TEXT NOT NULL,
        time_triggers TEXT NOT NULL,
        message_templates TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_campaigns_created_at ON recovery_campaigns(created_at);

    CREATE TABLE IF NOT EXISTS subscriptions (
        id TEXT PRIMARY KEY,
        user_email TEXT NOT NULL,
        plan_type TEXT NOT NULL,
        amount REAL NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );
";

const CART_COLUMNS: &str = "id, user_email, cart_value, items, abandoned_at, recovered, \
     recovery_email_sent, recovery_email_sent_at, recovery_email_opened";

const CAMPAIGN_COLUMNS: &str =
    "id, name, status, channels, time_triggers, message_templates, created_at, updated_at";

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_email, plan_type, amount, status, created_at, expires_at";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file; `None` keeps everything in memory
    pub path: Option<PathBuf>,
    /// Capacity of the change feed broadcast channel
    pub change_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            change_capacity: 1024,
        }
    }
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }
}

/// Relational store with a row-level change feed
pub struct Store {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Store {
    /// Open (or create) the store described by `config`
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE
                        | OpenFlags::SQLITE_OPEN_CREATE
                        | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.execute_batch(
                    "
                    PRAGMA journal_mode = WAL;
                    PRAGMA synchronous = NORMAL;
                    ",
                )?;
                conn
            }
            None => Connection::open_in_memory()?,
        };

        conn.execute_batch(SCHEMA)?;

        let (changes, _) = broadcast::channel(config.change_capacity.max(1));

        tracing::debug!(path = ?config.path, "Store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            path: config.path.clone(),
            changes,
        })
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Database file path, if the store is file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sender side of the change feed, for components that fan events out
    pub fn change_feed(&self) -> broadcast::Sender<ChangeEvent> {
        self.changes.clone()
    }

    /// A fresh receiver on the change feed
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Readiness check: the connection answers a trivial query
    pub async fn ping(&self) -> bool {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    // ============================================
    // abandoned_carts
    // ============================================

    /// Select carts matching `filter`, newest abandonment first
    pub async fn list_carts(&self, filter: &CartFilter) -> StoreResult<Vec<AbandonedCart>> {
        let mut sql = format!("SELECT {} FROM abandoned_carts", CART_COLUMNS);
        let mut clauses = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(recovered) = filter.recovered {
            clauses.push("recovered = ?");
            args.push(Value::Integer(recovered as i64));
        }
        if let Some(email) = &filter.user_email {
            clauses.push("user_email = ?");
            args.push(Value::Text(email.clone()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY abandoned_at DESC, rowid DESC");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), CartRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(CartRow::into_cart).collect()
    }

    pub async fn get_cart(&self, id: Uuid) -> StoreResult<AbandonedCart> {
        let conn = self.conn.lock().await;
        fetch_cart(&conn, id)
    }

    /// Insert carts atomically and return the stored rows
    pub async fn insert_carts(
        &self,
        carts: Vec<NewAbandonedCart>,
    ) -> StoreResult<Vec<AbandonedCart>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(carts.len());

        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO abandoned_carts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                CART_COLUMNS
            ))?;

            for new_cart in carts {
                let cart = new_cart.into_cart(Uuid::new_v4());
                stmt.execute(params![
                    cart.id.to_string(),
                    cart.user_email,
                    cart.cart_value,
                    serde_json::to_string(&cart.items)?,
                    encode_ts(&cart.abandoned_at),
                    cart.recovered,
                    cart.recovery_email_sent,
                    cart.recovery_email_sent_at.as_ref().map(encode_ts),
                    cart.recovery_email_opened,
                ])?;
                inserted.push(cart.id);
            }
        }

        let stored = inserted
            .into_iter()
            .map(|id| fetch_cart(&tx, id))
            .collect::<StoreResult<Vec<_>>>()?;
        tx.commit()?;
        drop(conn);

        for cart in &stored {
            self.publish(ChangeEvent::insert(
                Table::AbandonedCarts,
                serde_json::to_value(cart)?,
            ));
        }

        Ok(stored)
    }

    /// Single-row update of a cart's recovery fields
    pub async fn update_cart(&self, id: Uuid, patch: &CartPatch) -> StoreResult<AbandonedCart> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let old = fetch_cart(&tx, id)?;
        let mut new = old.clone();
        new.apply(patch);

        tx.execute(
            "UPDATE abandoned_carts
             SET recovered = ?1, recovery_email_sent = ?2,
                 recovery_email_sent_at = ?3, recovery_email_opened = ?4
             WHERE id = ?5",
            params![
                new.recovered,
                new.recovery_email_sent,
                new.recovery_email_sent_at.as_ref().map(encode_ts),
                new.recovery_email_opened,
                id.to_string(),
            ],
        )?;
        let stored = fetch_cart(&tx, id)?;
        tx.commit()?;
        drop(conn);

        self.publish(ChangeEvent::update(
            Table::AbandonedCarts,
            serde_json::to_value(&old)?,
            serde_json::to_value(&stored)?,
        ));

        Ok(stored)
    }

    // ============================================
    // recovery_campaigns
    // ============================================

    /// Select campaigns, optionally by status, newest first
    pub async fn list_campaigns(
        &self,
        status: Option<CampaignStatus>,
    ) -> StoreResult<Vec<RecoveryCampaign>> {
        let conn = self.conn.lock().await;

        let rows = match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM recovery_campaigns WHERE status = ?1
                     ORDER BY created_at DESC, rowid DESC",
                    CAMPAIGN_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![status.as_str()], CampaignRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM recovery_campaigns ORDER BY created_at DESC, rowid DESC",
                    CAMPAIGN_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], CampaignRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        rows.into_iter().map(CampaignRow::into_campaign).collect()
    }

    pub async fn get_campaign(&self, id: Uuid) -> StoreResult<RecoveryCampaign> {
        let conn = self.conn.lock().await;
        fetch_campaign(&conn, id)
    }

    /// Insert campaigns atomically and return the stored rows
    pub async fn insert_campaigns(
        &self,
        campaigns: Vec<NewRecoveryCampaign>,
    ) -> StoreResult<Vec<RecoveryCampaign>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(campaigns.len());

        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO recovery_campaigns ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                CAMPAIGN_COLUMNS
            ))?;

            for new_campaign in campaigns {
                let campaign = new_campaign.into_campaign(Uuid::new_v4(), Utc::now());
                stmt.execute(params![
                    campaign.id.to_string(),
                    campaign.name,
                    campaign.status.as_str(),
                    serde_json::to_string(&campaign.channels)?,
                    serde_json::to_string(&campaign.time_triggers)?,
                    serde_json::to_string(&campaign.message_templates)?,
                    encode_ts(&campaign.created_at),
                    encode_ts(&campaign.updated_at),
                ])?;
                inserted.push(campaign.id);
            }
        }

        let stored = inserted
            .into_iter()
            .map(|id| fetch_campaign(&tx, id))
            .collect::<StoreResult<Vec<_>>>()?;
        tx.commit()?;
        drop(conn);

        for campaign in &stored {
            self.publish(ChangeEvent::insert(
                Table::RecoveryCampaigns,
                serde_json::to_value(campaign)?,
            ));
        }

        Ok(stored)
    }

    /// Set a campaign's status and stamp `updated_at`
    pub async fn update_campaign_status(
        &self,
        id: Uuid,
        status: CampaignStatus,
    ) -> StoreResult<RecoveryCampaign> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let old = fetch_campaign(&tx, id)?;
        tx.execute(
            "UPDATE recovery_campaigns SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), encode_ts(&Utc::now()), id.to_string()],
        )?;
        let stored = fetch_campaign(&tx, id)?;
        tx.commit()?;
        drop(conn);

        self.publish(ChangeEvent::update(
            Table::RecoveryCampaigns,
            serde_json::to_value(&old)?,
            serde_json::to_value(&stored)?,
        ));

        Ok(stored)
    }

    // ============================================
    // subscriptions
    // ============================================

    pub async fn insert_subscription(&self, new: NewSubscription) -> StoreResult<Subscription> {
        let subscription = new.into_subscription(Uuid::new_v4(), Utc::now());

        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO subscriptions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                SUBSCRIPTION_COLUMNS
            ),
            params![
                subscription.id.to_string(),
                subscription.user_email,
                subscription.plan_type,
                subscription.amount,
                subscription.status,
                encode_ts(&subscription.created_at),
                encode_ts(&subscription.expires_at),
            ],
        )?;
        let stored = fetch_subscription(&conn, subscription.id)?;
        drop(conn);

        self.publish(ChangeEvent::insert(
            Table::Subscriptions,
            serde_json::to_value(&stored)?,
        ));

        Ok(stored)
    }

    /// All subscriptions, newest first
    pub async fn list_subscriptions(&self) -> StoreResult<Vec<Subscription>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM subscriptions ORDER BY created_at DESC, rowid DESC",
            SUBSCRIPTION_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], SubscriptionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(SubscriptionRow::into_subscription).collect()
    }

    fn publish(&self, event: ChangeEvent) {
        tracing::trace!(
            table = %event.table,
            event = event.event_type.as_str(),
            "Publishing change"
        );
        // No receivers is fine: nobody is listening yet
        let _ = self.changes.send(event);
    }
}

fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_ts(table: Table, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(table, format!("bad timestamp '{}': {}", raw, e)))
}

fn decode_id(table: Table, raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::corrupt(table, format!("bad id '{}': {}", raw, e)))
}

fn fetch_cart(conn: &Connection, id: Uuid) -> StoreResult<AbandonedCart> {
    conn.query_row(
        &format!("SELECT {} FROM abandoned_carts WHERE id = ?1", CART_COLUMNS),
        params![id.to_string()],
        CartRow::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(Table::AbandonedCarts, id))?
    .into_cart()
}

fn fetch_campaign(conn: &Connection, id: Uuid) -> StoreResult<RecoveryCampaign> {
    conn.query_row(
        &format!(
            "SELECT {} FROM recovery_campaigns WHERE id = ?1",
            CAMPAIGN_COLUMNS
        ),
        params![id.to_string()],
        CampaignRow::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(Table::RecoveryCampaigns, id))?
    .into_campaign()
}

fn fetch_subscription(conn: &Connection, id: Uuid) -> StoreResult<Subscription> {
    conn.query_row(
        &format!(
            "SELECT {} FROM subscriptions WHERE id = ?1",
            SUBSCRIPTION_COLUMNS
        ),
        params![id.to_string()],
        SubscriptionRow::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(Table::Subscriptions, id))?
    .into_subscription()
}

/// Raw column values of an `abandoned_carts` row
struct CartRow {
    id: String,
    user_email: String,
    cart_value: f64,
    items: String,
    abandoned_at: String,
    recovered: bool,
    recovery_email_sent: bool,
    recovery_email_sent_at: Option<String>,
    recovery_email_opened: bool,
}

impl CartRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_email: row.get(1)?,
            cart_value: row.get(2)?,
            items: row.get(3)?,
            abandoned_at: row.get(4)?,
            recovered: row.get(5)?,
            recovery_email_sent: row.get(6)?,
            recovery_email_sent_at: row.get(7)?,
            recovery_email_opened: row.get(8)?,
        })
    }

    fn into_cart(self) -> StoreResult<AbandonedCart> {
        let table = Table::AbandonedCarts;
        Ok(AbandonedCart {
            id: decode_id(table, &self.id)?,
            user_email: self.user_email,
            cart_value: self.cart_value,
            items: serde_json::from_str(&self.items)?,
            abandoned_at: decode_ts(table, &self.abandoned_at)?,
            recovered: self.recovered,
            recovery_email_sent: self.recovery_email_sent,
            recovery_email_sent_at: self
                .recovery_email_sent_at
                .as_deref()
                .map(|raw| decode_ts(table, raw))
                .transpose()?,
            recovery_email_opened: self.recovery_email_opened,
        })
    }
}

/// Raw column values of a `recovery_campaigns` row
struct CampaignRow {
    id: String,
    name: String,
    status: String,
    channels: String,
    time_triggers: String,
    message_templates: String,
    created_at: String,
    updated_at: String,
}

impl CampaignRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            channels: row.get(3)?,
            time_triggers: row.get(4)?,
            message_templates: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_campaign(self) -> StoreResult<RecoveryCampaign> {
        let table = Table::RecoveryCampaigns;
        Ok(RecoveryCampaign {
            id: decode_id(table, &self.id)?,
            name: self.name,
            status: self
                .status
                .parse()
                .map_err(|e: String| StoreError::corrupt(table, e))?,
            channels: serde_json::from_str(&self.channels)?,
            time_triggers: serde_json::from_str(&self.time_triggers)?,
            message_templates: serde_json::from_str(&self.message_templates)?,
            created_at: decode_ts(table, &self.created_at)?,
            updated_at: decode_ts(table, &self.updated_at)?,
        })
    }
}

/// Raw column values of a `subscriptions` row
struct SubscriptionRow {
    id: String,
    user_email: String,
    plan_type: String,
    amount: f64,
    status: String,
    created_at: String,
    expires_at: String,
}

impl SubscriptionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_email: row.get(1)?,
            plan_type: row.get(2)?,
            amount: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
            expires_at: row.get(6)?,
        })
    }

    fn into_subscription(self) -> StoreResult<Subscription> {
        let table = Table::Subscriptions;
        Ok(Subscription {
            id: decode_id(table, &self.id)?,
            user_email: self.user_email,
            plan_type: self.plan_type,
            amount: self.amount,
            status: self.status,
            created_at: decode_ts(table, &self.created_at)?,
            expires_at: decode_ts(table, &self.expires_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::changes::ChangeKind;
    use crate::store::types::CartItem;
    use chrono::Duration;
    use tempfile::tempdir;

    fn cart(email: &str, hours_ago: i64) -> NewAbandonedCart {
        NewAbandonedCart::new(
            email,
            vec![CartItem::new("p5", "Gaming Console", 499.99, 1)],
        )
        .abandoned_at(Utc::now() - Duration::hours(hours_ago))
    }

    #[tokio::test]
    async fn test_store_creation() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.ping().await);
        assert!(store.list_carts(&CartFilter::default()).await.unwrap().is_empty());
        assert!(store.list_campaigns(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_list_carts_newest_first() {
        let store = Store::open_in_memory().unwrap();

        store
            .insert_carts(vec![
                cart("old@example.com", 48),
                cart("new@example.com", 1),
                cart("mid@example.com", 12),
            ])
            .await
            .unwrap();

        let carts = store.list_carts(&CartFilter::default()).await.unwrap();
        let emails: Vec<_> = carts.iter().map(|c| c.user_email.as_str()).collect();
        assert_eq!(emails, vec!["new@example.com", "mid@example.com", "old@example.com"]);
        assert_eq!(carts[0].items[0].name, "Gaming Console");
    }

    #[tokio::test]
    async fn test_cart_filters() {
        let store = Store::open_in_memory().unwrap();
        let inserted = store
            .insert_carts(vec![cart("a@example.com", 2), cart("b@example.com", 3)])
            .await
            .unwrap();

        store
            .update_cart(inserted[0].id, &CartPatch::recovered())
            .await
            .unwrap();

        let recovered = store
            .list_carts(&CartFilter {
                recovered: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].user_email, "a@example.com");

        let by_email = store
            .list_carts(&CartFilter {
                user_email: Some("b@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert!(!by_email[0].recovered);
    }

    #[tokio::test]
    async fn test_update_missing_cart_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .update_cart(Uuid::new_v4(), &CartPatch::recovered())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_publishes_old_and_new() {
        let store = Store::open_in_memory().unwrap();
        let inserted = store.insert_carts(vec![cart("a@example.com", 1)]).await.unwrap();

        let mut rx = store.subscribe_changes();
        let sent_at = Utc::now();
        let updated = store
            .update_cart(inserted[0].id, &CartPatch::email_sent(sent_at))
            .await
            .unwrap();
        assert!(updated.recovery_email_sent);
        assert!(updated.recovery_email_sent_at.is_some());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, Table::AbandonedCarts);
        assert_eq!(event.event_type, ChangeKind::Update);
        assert_eq!(event.old["recovery_email_sent"], false);
        assert_eq!(event.new["recovery_email_sent"], true);
    }

    #[tokio::test]
    async fn test_insert_publishes_each_row() {
        let store = Store::open_in_memory().unwrap();
        let mut rx = store.subscribe_changes();

        store
            .insert_carts(vec![cart("a@example.com", 1), cart("b@example.com", 2)])
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type, ChangeKind::Insert);
        assert_eq!(first.new["user_email"], "a@example.com");
        assert_eq!(second.new["user_email"], "b@example.com");
        assert!(first.old.is_null());
    }

    #[tokio::test]
    async fn test_campaign_status_update_and_filter() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .insert_campaigns(vec![
                NewRecoveryCampaign::new("Welcome Back", CampaignStatus::Active)
                    .channel("Email")
                    .trigger("1 hour after abandonment")
                    .template("subject", "Don't miss out on your items!"),
                NewRecoveryCampaign::new("VIP Recovery", CampaignStatus::Draft),
            ])
            .await
            .unwrap();

        assert_eq!(created[0].channels, vec!["Email"]);
        assert_eq!(
            created[0].message_templates["subject"],
            "Don't miss out on your items!"
        );

        let archived = store
            .update_campaign_status(created[0].id, CampaignStatus::Archived)
            .await
            .unwrap();
        assert_eq!(archived.status, CampaignStatus::Archived);
        assert!(archived.updated_at >= archived.created_at);

        let drafts = store.list_campaigns(Some(CampaignStatus::Draft)).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "VIP Recovery");

        let active = store.list_campaigns(Some(CampaignStatus::Active)).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_subscriptions() {
        let store = Store::open_in_memory().unwrap();
        let expires_at = Utc::now() + Duration::days(30);
        let sub = store
            .insert_subscription(NewSubscription {
                user_email: "emma.wilson@example.com".to_string(),
                plan_type: "recovery".to_string(),
                amount: 129.99,
                status: "active".to_string(),
                expires_at,
            })
            .await
            .unwrap();

        let all = store.list_subscriptions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, sub.id);
        assert_eq!(all[0].plan_type, "recovery");
    }

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::file(dir.path().join("data").join("cartback.db"));

        let id = {
            let store = Store::open(&config).unwrap();
            let carts = store.insert_carts(vec![cart("keep@example.com", 5)]).await.unwrap();
            carts[0].id
        };

        let store = Store::open(&config).unwrap();
        let cart = store.get_cart(id).await.unwrap();
        assert_eq!(cart.user_email, "keep@example.com");
        assert!(store.path().is_some());
    }
}
