//! Dashboard analytics
//!
//! Read models behind the dashboard pages:
//!
//! - **stats**: live metrics over stored carts, stat cards, monthly trend,
//!   recent carts and goal progress
//! - **fixtures**: fixed chart series (channels, abandonment reasons, funnel,
//!   visitor segments)
//! - **experiments**: A/B test results with leader and lift
//! - **discounts**: in-memory discount strategies and suggestions
//! - **sentiment**: in-memory customer feedback with a keyword classifier
//! - **format**: counts, currency and relative time for display

pub mod discounts;
pub mod experiments;
pub mod fixtures;
pub mod format;
pub mod sentiment;
pub mod stats;

pub use discounts::{DiscountBook, DiscountStatus, DiscountSuggestion, StrategyCard};
pub use experiments::{ExperimentStatus, ExperimentSummary};
pub use fixtures::CheckoutFunnel;
pub use sentiment::{FeedbackBoard, FeedbackQuery, Sentiment, SentimentDistribution, SortOrder};
pub use stats::{
    dashboard_cards, monthly_trend, recent_carts, AnalyticsPeriod, CartMetrics, Progress,
    RecentCart, StatCard, TrendPoint,
};
