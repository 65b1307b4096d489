//! Discount strategies
//!
//! An in-memory book of recovery incentives. Strategies can be activated or
//! paused (each change publishes a notice) and a rule-based suggestion is
//! derived from live cart metrics.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::stats::CartMetrics;
use crate::services::{Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountStatus {
    Active,
    Draft,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferKind {
    Percentage,
    Fixed,
    Shipping,
    Gift,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub kind: OfferKind,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Offer {
    pub fn label(&self) -> String {
        match self.kind {
            OfferKind::Percentage => format!("{}% off", self.value),
            OfferKind::Fixed => format!("${} off", self.value),
            OfferKind::Shipping => "Free shipping".to_string(),
            OfferKind::Gift => format!("Free gift (value: ${})", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountStrategy {
    pub id: String,
    pub name: String,
    pub status: DiscountStatus,
    pub offer: Offer,
    pub segments: Vec<String>,
    pub conversion_rate: u32,
    pub applicable_orders: u32,
    pub total_orders: u32,
}

impl DiscountStrategy {
    /// Applicable orders as a rounded percent of all orders
    pub fn coverage(&self) -> u32 {
        if self.total_orders == 0 {
            return 0;
        }
        (self.applicable_orders as f64 / self.total_orders as f64 * 100.0).round() as u32
    }
}

/// Strategy with its display fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyCard {
    #[serde(flatten)]
    pub strategy: DiscountStrategy,
    pub offer_label: String,
    pub coverage: u32,
}

impl From<DiscountStrategy> for StrategyCard {
    fn from(strategy: DiscountStrategy) -> Self {
        Self {
            offer_label: strategy.offer.label(),
            coverage: strategy.coverage(),
            strategy,
        }
    }
}

/// Rule-based recommendation for a new strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountSuggestion {
    pub discount_type: String,
    pub target_segment: String,
    pub timing: String,
    pub predicted_lift: String,
    pub confidence: String,
    pub offer: Offer,
    pub based_on: CartMetrics,
}

const HIGH_VALUE_CART: f64 = 100.0;

/// Suggest an incentive from current recovery performance
///
/// Weak recovery calls for a deeper percentage discount, healthy recovery
/// for the standard 10-15% band, and strong recovery only needs free
/// shipping.
pub fn suggest(metrics: &CartMetrics) -> DiscountSuggestion {
    let (discount_type, incentive, predicted_lift) = if metrics.recovery_rate < 20.0 {
        (
            "Dynamic Percentage (15-20%)",
            offer(OfferKind::Percentage, 20.0, None),
            "+31% vs standard recovery",
        )
    } else if metrics.recovery_rate < 35.0 {
        (
            "Dynamic Percentage (10-15%)",
            offer(OfferKind::Percentage, 15.0, None),
            "+24% vs standard recovery",
        )
    } else {
        (
            "Free shipping",
            offer(OfferKind::Shipping, 0.0, None),
            "+12% vs standard recovery",
        )
    };

    let average_cart = if metrics.total_carts == 0 {
        0.0
    } else {
        metrics.abandoned_value / metrics.total_carts as f64
    };
    let target_segment = if average_cart > HIGH_VALUE_CART {
        "High-value carts over $100"
    } else {
        "Returning Customers with 2+ previous purchases"
    };

    let confidence = if metrics.total_carts >= 50 {
        "High Confidence"
    } else {
        "Low Confidence"
    };

    DiscountSuggestion {
        discount_type: discount_type.to_string(),
        target_segment: target_segment.to_string(),
        timing: "1 hour after abandonment + 24 hour expiry".to_string(),
        predicted_lift: predicted_lift.to_string(),
        confidence: confidence.to_string(),
        offer: incentive,
        based_on: *metrics,
    }
}

fn strategy(
    id: &str,
    name: &str,
    status: DiscountStatus,
    offer: Offer,
    segments: &[&str],
    conversion_rate: u32,
    applicable_orders: u32,
    total_orders: u32,
) -> DiscountStrategy {
    DiscountStrategy {
        id: id.to_string(),
        name: name.to_string(),
        status,
        offer,
        segments: segments.iter().map(|s| s.to_string()).collect(),
        conversion_rate,
        applicable_orders,
        total_orders,
    }
}

fn offer(kind: OfferKind, value: f64, condition: Option<&str>) -> Offer {
    Offer {
        kind,
        value,
        condition: condition.map(str::to_string),
    }
}

pub fn default_strategies() -> Vec<DiscountStrategy> {
    vec![
        strategy(
            "1",
            "High-value cart recovery",
            DiscountStatus::Active,
            offer(OfferKind::Percentage, 15.0, Some("For carts over $100")),
            &["High-value", "Returning customers"],
            32,
            87,
            220,
        ),
        strategy(
            "2",
            "New customer welcome discount",
            DiscountStatus::Active,
            offer(OfferKind::Fixed, 10.0, Some("First-time abandoners")),
            &["New customers"],
            28,
            43,
            130,
        ),
        strategy(
            "3",
            "Premium customer loyalty",
            DiscountStatus::Draft,
            offer(OfferKind::Shipping, 0.0, None),
            &["VIP", "High LTV"],
            0,
            12,
            40,
        ),
        strategy(
            "4",
            "Holiday flash offer",
            DiscountStatus::Paused,
            offer(OfferKind::Percentage, 20.0, Some("Limited 24-hour window")),
            &["All segments"],
            38,
            156,
            320,
        ),
    ]
}

/// In-memory strategy book
pub struct DiscountBook {
    strategies: RwLock<Vec<DiscountStrategy>>,
    notifier: Arc<dyn Notifier>,
}

impl DiscountBook {
    /// Book seeded with the stock strategies
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_strategies(default_strategies(), notifier)
    }

    pub fn with_strategies(strategies: Vec<DiscountStrategy>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            strategies: RwLock::new(strategies),
            notifier,
        }
    }

    pub async fn list(&self) -> Vec<StrategyCard> {
        self.strategies
            .read()
            .await
            .iter()
            .cloned()
            .map(StrategyCard::from)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<StrategyCard> {
        self.strategies
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .map(StrategyCard::from)
    }

    async fn set_status(&self, id: &str, status: DiscountStatus) -> Option<StrategyCard> {
        let mut strategies = self.strategies.write().await;
        let strategy = strategies.iter_mut().find(|s| s.id == id)?;
        strategy.status = status;
        tracing::info!(strategy_id = %id, status = ?status, "Discount strategy status changed");
        Some(StrategyCard::from(strategy.clone()))
    }

    /// Activate a strategy; `None` if the id is unknown
    pub async fn activate(&self, id: &str) -> Option<StrategyCard> {
        let card = self.set_status(id, DiscountStatus::Active).await?;
        self.notifier.notify(Notice::success(
            "Strategy activated",
            format!("The discount strategy \"{}\" has been activated.", card.strategy.name),
        ));
        Some(card)
    }

    /// Pause a strategy; `None` if the id is unknown
    pub async fn pause(&self, id: &str) -> Option<StrategyCard> {
        let card = self.set_status(id, DiscountStatus::Paused).await?;
        self.notifier.notify(Notice::success(
            "Strategy paused",
            format!("The discount strategy \"{}\" has been paused.", card.strategy.name),
        ));
        Some(card)
    }

    /// Store a suggestion as a new draft strategy
    pub async fn apply_suggestion(&self, suggestion: &DiscountSuggestion) -> StrategyCard {
        let mut strategies = self.strategies.write().await;
        let next_id = strategies
            .iter()
            .filter_map(|s| s.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let strategy = DiscountStrategy {
            id: next_id.to_string(),
            name: format!("Suggested: {}", suggestion.discount_type),
            status: DiscountStatus::Draft,
            offer: suggestion.offer.clone(),
            segments: vec![suggestion.target_segment.clone()],
            conversion_rate: 0,
            applicable_orders: 0,
            total_orders: 0,
        };
        strategies.push(strategy.clone());
        drop(strategies);

        self.notifier.notify(Notice::success(
            "AI strategy applied",
            "The AI-suggested discount strategy has been created and is ready for review.",
        ));
        StrategyCard::from(strategy)
    }
}
