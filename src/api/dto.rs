//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::fixtures::{ChannelRecovery, CheckoutFunnel, Share, VisitorSegment};
use crate::analytics::format::humanize_since;
use crate::analytics::{
    CartMetrics, ExperimentSummary, RecentCart, StatCard, StrategyCard, TrendPoint,
};
use crate::demo::DEFAULT_DEMO_CARTS;
use crate::store::{
    AbandonedCart, CampaignStatus, CartItem, NewAbandonedCart, RecoveryCampaign, RecoveryStatus,
};

// ============================================
// CART DTOs
// ============================================

/// Cart with its derived status
#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(flatten)]
    pub cart: AbandonedCart,
    pub status: RecoveryStatus,
    pub item_count: u32,
}

impl From<AbandonedCart> for CartResponse {
    fn from(cart: AbandonedCart) -> Self {
        Self {
            status: cart.status(),
            item_count: cart.item_count(),
            cart,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartListResponse {
    pub carts: Vec<CartResponse>,
    pub total: usize,
}

/// Log an abandoned cart
#[derive(Debug, Deserialize)]
pub struct CreateCartRequest {
    pub user_email: String,
    pub items: Vec<CartItem>,
    /// Defaults to the sum of the item lines
    #[serde(default)]
    pub cart_value: Option<f64>,
    /// Defaults to now
    #[serde(default)]
    pub abandoned_at: Option<DateTime<Utc>>,
}

impl From<CreateCartRequest> for NewAbandonedCart {
    fn from(req: CreateCartRequest) -> Self {
        let mut cart = NewAbandonedCart::new(req.user_email, req.items);
        if let Some(value) = req.cart_value {
            cart.cart_value = value;
        }
        match req.abandoned_at {
            Some(at) => cart.abandoned_at(at),
            None => cart,
        }
    }
}

// ============================================
// CAMPAIGN DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CampaignListQuery {
    /// active, draft or archived
    #[serde(default)]
    pub status: Option<String>,
}

/// Campaign with its relative last-modified time
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    #[serde(flatten)]
    pub campaign: RecoveryCampaign,
    /// e.g. "2 days ago"
    pub last_modified: String,
}

impl CampaignResponse {
    pub fn new(campaign: RecoveryCampaign, now: DateTime<Utc>) -> Self {
        Self {
            last_modified: humanize_since(campaign.updated_at, now),
            campaign,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignListResponse {
    pub campaigns: Vec<CampaignResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignStatusRequest {
    pub status: CampaignStatus,
}

// ============================================
// DASHBOARD DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub cards: Vec<StatCard>,
    pub trend: Vec<TrendPoint>,
    pub channels: Vec<ChannelRecovery>,
    pub recent_carts: Vec<RecentCart>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub current: f64,
    pub target: f64,
}

// ============================================
// ANALYTICS DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// 7days, 30days, 90days or year
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub period: String,
    pub label: String,
    pub metrics: CartMetrics,
    pub abandonment_reasons: Vec<Share>,
    pub time_spent: Vec<Share>,
    pub funnel: CheckoutFunnel,
    pub segments: Vec<VisitorSegment>,
}

#[derive(Debug, Deserialize)]
pub struct ExperimentQuery {
    /// running or completed
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExperimentListResponse {
    pub experiments: Vec<ExperimentSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct StrategyListResponse {
    pub strategies: Vec<StrategyCard>,
    pub total: usize,
}

// ============================================
// FEEDBACK DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub content: String,
    pub customer: String,
}

// ============================================
// DEMO DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct DemoCartsRequest {
    #[serde(default = "default_demo_count")]
    pub count: usize,
}

fn default_demo_count() -> usize {
    DEFAULT_DEMO_CARTS
}

impl Default for DemoCartsRequest {
    fn default() -> Self {
        Self {
            count: default_demo_count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DemoResponse<T> {
    pub created: usize,
    pub items: Vec<T>,
}

impl<T> DemoResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            created: items.len(),
            items,
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", "unhealthy"
    pub status: String,
    /// Store status: "ok" or "error"
    pub store: String,
    /// Open WebSocket connections
    pub connections: usize,
    /// Open change-feed channels
    pub channels: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
