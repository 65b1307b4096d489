//! Record types for the cart-recovery store
//!
//! - `AbandonedCart` / `NewAbandonedCart` / `CartPatch`: shopping carts left
//!   before checkout and the single-row updates issued against them
//! - `RecoveryCampaign` / `NewRecoveryCampaign`: configured message sequences
//! - `Subscription` / `NewSubscription`: plans created by successful payments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A line in an abandoned cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
            image: None,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A shopping cart recorded before checkout completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbandonedCart {
    pub id: Uuid,
    pub user_email: String,
    pub cart_value: f64,
    pub items: Vec<CartItem>,
    pub abandoned_at: DateTime<Utc>,
    pub recovered: bool,
    pub recovery_email_sent: bool,
    pub recovery_email_sent_at: Option<DateTime<Utc>>,
    pub recovery_email_opened: bool,
}

impl AbandonedCart {
    /// Total number of units across all lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn status(&self) -> RecoveryStatus {
        if self.recovered {
            RecoveryStatus::Recovered
        } else if !self.recovery_email_sent {
            RecoveryStatus::NotSent
        } else {
            RecoveryStatus::NotRecovered
        }
    }

    pub(crate) fn apply(&mut self, patch: &CartPatch) {
        if let Some(recovered) = patch.recovered {
            self.recovered = recovered;
        }
        if let Some(sent) = patch.recovery_email_sent {
            self.recovery_email_sent = sent;
        }
        if let Some(sent_at) = patch.recovery_email_sent_at {
            self.recovery_email_sent_at = sent_at;
        }
        if let Some(opened) = patch.recovery_email_opened {
            self.recovery_email_opened = opened;
        }
    }
}

/// Where a cart stands in the recovery flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryStatus {
    #[serde(rename = "Recovered")]
    Recovered,
    #[serde(rename = "Not Recovered")]
    NotRecovered,
    #[serde(rename = "Not Sent")]
    NotSent,
}

impl fmt::Display for RecoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryStatus::Recovered => write!(f, "Recovered"),
            RecoveryStatus::NotRecovered => write!(f, "Not Recovered"),
            RecoveryStatus::NotSent => write!(f, "Not Sent"),
        }
    }
}

/// Insert payload for an abandoned cart (everything but the id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAbandonedCart {
    pub user_email: String,
    pub cart_value: f64,
    pub items: Vec<CartItem>,
    #[serde(default = "Utc::now")]
    pub abandoned_at: DateTime<Utc>,
    #[serde(default)]
    pub recovered: bool,
    #[serde(default)]
    pub recovery_email_sent: bool,
    #[serde(default)]
    pub recovery_email_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recovery_email_opened: bool,
}

impl NewAbandonedCart {
    /// Cart abandoned now, with its value summed from the items
    pub fn new(user_email: impl Into<String>, items: Vec<CartItem>) -> Self {
        let cart_value = items.iter().map(CartItem::line_total).sum();
        Self {
            user_email: user_email.into(),
            cart_value,
            items,
            abandoned_at: Utc::now(),
            recovered: false,
            recovery_email_sent: false,
            recovery_email_sent_at: None,
            recovery_email_opened: false,
        }
    }

    pub fn abandoned_at(mut self, at: DateTime<Utc>) -> Self {
        self.abandoned_at = at;
        self
    }

    pub fn recovered(mut self, recovered: bool) -> Self {
        self.recovered = recovered;
        self
    }

    pub fn email_sent(mut self, at: DateTime<Utc>, opened: bool) -> Self {
        self.recovery_email_sent = true;
        self.recovery_email_sent_at = Some(at);
        self.recovery_email_opened = opened;
        self
    }

    pub(crate) fn into_cart(self, id: Uuid) -> AbandonedCart {
        AbandonedCart {
            id,
            user_email: self.user_email,
            cart_value: self.cart_value,
            items: self.items,
            abandoned_at: self.abandoned_at,
            recovered: self.recovered,
            recovery_email_sent: self.recovery_email_sent,
            recovery_email_sent_at: self.recovery_email_sent_at,
            recovery_email_opened: self.recovery_email_opened,
        }
    }
}

/// Single-row update of a cart's recovery fields; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartPatch {
    pub recovered: Option<bool>,
    pub recovery_email_sent: Option<bool>,
    pub recovery_email_sent_at: Option<Option<DateTime<Utc>>>,
    pub recovery_email_opened: Option<bool>,
}

impl CartPatch {
    pub fn recovered() -> Self {
        Self {
            recovered: Some(true),
            ..Default::default()
        }
    }

    pub fn email_sent(at: DateTime<Utc>) -> Self {
        Self {
            recovery_email_sent: Some(true),
            recovery_email_sent_at: Some(Some(at)),
            ..Default::default()
        }
    }

    pub fn email_opened() -> Self {
        Self {
            recovery_email_opened: Some(true),
            ..Default::default()
        }
    }
}

/// Equality filters for listing carts
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CartFilter {
    #[serde(default)]
    pub recovered: Option<bool>,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// Lifecycle state of a recovery campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Draft,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Draft => "draft",
            CampaignStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CampaignStatus::Active),
            "draft" => Ok(CampaignStatus::Draft),
            "archived" => Ok(CampaignStatus::Archived),
            _ => Err(format!(
                "Invalid campaign status: {}. Use active, draft, or archived",
                s
            )),
        }
    }
}

/// A configured sequence of outbound recovery messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryCampaign {
    pub id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub channels: Vec<String>,
    pub time_triggers: Vec<String>,
    pub message_templates: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a campaign (id and timestamps are assigned by the store)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRecoveryCampaign {
    pub name: String,
    pub status: CampaignStatus,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub time_triggers: Vec<String>,
    #[serde(default)]
    pub message_templates: serde_json::Map<String, serde_json::Value>,
}

impl NewRecoveryCampaign {
    pub fn new(name: impl Into<String>, status: CampaignStatus) -> Self {
        Self {
            name: name.into(),
            status,
            channels: Vec::new(),
            time_triggers: Vec::new(),
            message_templates: serde_json::Map::new(),
        }
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.time_triggers.push(trigger.into());
        self
    }

    pub fn template(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.message_templates
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    pub(crate) fn into_campaign(self, id: Uuid, now: DateTime<Utc>) -> RecoveryCampaign {
        RecoveryCampaign {
            id,
            name: self.name,
            status: self.status,
            channels: self.channels,
            time_triggers: self.time_triggers,
            message_templates: self.message_templates,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A plan created for a customer after a successful recovery payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub user_email: String,
    pub plan_type: String,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSubscription {
    pub user_email: String,
    pub plan_type: String,
    pub amount: f64,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

impl NewSubscription {
    pub(crate) fn into_subscription(self, id: Uuid, now: DateTime<Utc>) -> Subscription {
        Subscription {
            id,
            user_email: self.user_email,
            plan_type: self.plan_type,
            amount: self.amount,
            status: self.status,
            created_at: now,
            expires_at: self.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<CartItem> {
        vec![
            CartItem::new("p1", "Ultra HD Smart TV", 699.99, 1),
            CartItem::new("p3", "Smart Home Speaker", 129.99, 2),
        ]
    }

    #[test]
    fn test_new_cart_sums_items() {
        let cart = NewAbandonedCart::new("alex@example.com", sample_items());
        assert!((cart.cart_value - 959.97).abs() < 1e-9);
        assert!(!cart.recovered);
        assert!(cart.recovery_email_sent_at.is_none());
    }

    #[test]
    fn test_status_derivation() {
        let mut cart = NewAbandonedCart::new("a@example.com", sample_items()).into_cart(Uuid::new_v4());
        assert_eq!(cart.status(), RecoveryStatus::NotSent);

        cart.apply(&CartPatch::email_sent(Utc::now()));
        assert_eq!(cart.status(), RecoveryStatus::NotRecovered);

        cart.apply(&CartPatch::recovered());
        assert_eq!(cart.status(), RecoveryStatus::Recovered);
        assert_eq!(cart.status().to_string(), "Recovered");
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_patch_leaves_unset_fields() {
        let sent_at = Utc::now();
        let mut cart = NewAbandonedCart::new("a@example.com", sample_items())
            .email_sent(sent_at, true)
            .into_cart(Uuid::new_v4());

        cart.apply(&CartPatch::recovered());
        assert!(cart.recovered);
        assert!(cart.recovery_email_sent);
        assert_eq!(cart.recovery_email_sent_at, Some(sent_at));
        assert!(cart.recovery_email_opened);
    }

    #[test]
    fn test_campaign_status_parse() {
        assert_eq!("ACTIVE".parse::<CampaignStatus>().unwrap(), CampaignStatus::Active);
        assert_eq!("draft".parse::<CampaignStatus>().unwrap(), CampaignStatus::Draft);
        assert!("paused".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn test_new_cart_deserialize_defaults() {
        let json = r#"{
            "user_email": "jane.smith@example.com",
            "cart_value": 249.99,
            "items": [{"id": "p2", "name": "Headphones", "price": 249.99, "quantity": 1}]
        }"#;
        let cart: NewAbandonedCart = serde_json::from_str(json).unwrap();
        assert!(!cart.recovered);
        assert!(!cart.recovery_email_sent);
        assert_eq!(cart.items[0].image, None);
    }

    #[test]
    fn test_recovery_status_serialize() {
        let json = serde_json::to_string(&RecoveryStatus::NotSent).unwrap();
        assert_eq!(json, "\"Not Sent\"");
    }
}
