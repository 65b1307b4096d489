//! Live metrics over stored carts
//!
//! Everything here is a pure function of a cart slice and a reference time,
//! so handlers fetch once and derive every view from the same snapshot.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::format::{format_count, format_currency, format_currency_whole, format_percent, humanize_since};
use crate::store::{AbandonedCart, RecoveryStatus};

/// Length of the "this month" window used by stat card changes
pub const COMPARISON_WINDOW_DAYS: i64 = 30;

const CHANGE_PERIOD: &str = "vs. last month";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Percentage of `part` in `whole`; zero when `whole` is zero
fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Aggregate counters over a set of carts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CartMetrics {
    pub total_carts: u64,
    pub recovered_carts: u64,
    pub emails_sent: u64,
    pub emails_opened: u64,
    pub abandoned_value: f64,
    pub revenue_recovered: f64,
    /// Percent of carts recovered
    pub recovery_rate: f64,
    /// Percent of sent recovery emails that were opened
    pub email_open_rate: f64,
}

impl CartMetrics {
    pub fn from_carts<'a>(carts: impl IntoIterator<Item = &'a AbandonedCart>) -> Self {
        let mut metrics = CartMetrics::default();

        for cart in carts {
            metrics.total_carts += 1;
            metrics.abandoned_value += cart.cart_value;
            if cart.recovered {
                metrics.recovered_carts += 1;
                metrics.revenue_recovered += cart.cart_value;
            }
            if cart.recovery_email_sent {
                metrics.emails_sent += 1;
                if cart.recovery_email_opened {
                    metrics.emails_opened += 1;
                }
            }
        }

        metrics.recovery_rate = percent_of(metrics.recovered_carts, metrics.total_carts);
        metrics.email_open_rate = percent_of(metrics.emails_opened, metrics.emails_sent);
        metrics
    }

    /// Metrics over carts abandoned in `(from, to]`
    pub fn between(carts: &[AbandonedCart], from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::from_carts(
            carts
                .iter()
                .filter(|c| c.abandoned_at > from && c.abandoned_at <= to),
        )
    }
}

/// Selectable analytics window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyticsPeriod {
    #[serde(rename = "7days")]
    Week,
    #[default]
    #[serde(rename = "30days")]
    Month,
    #[serde(rename = "90days")]
    Quarter,
    #[serde(rename = "year")]
    Year,
}

impl AnalyticsPeriod {
    pub fn all() -> &'static [AnalyticsPeriod] {
        &[
            AnalyticsPeriod::Week,
            AnalyticsPeriod::Month,
            AnalyticsPeriod::Quarter,
            AnalyticsPeriod::Year,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsPeriod::Week => "7days",
            AnalyticsPeriod::Month => "30days",
            AnalyticsPeriod::Quarter => "90days",
            AnalyticsPeriod::Year => "year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalyticsPeriod::Week => "Last 7 days",
            AnalyticsPeriod::Month => "Last 30 days",
            AnalyticsPeriod::Quarter => "Last 90 days",
            AnalyticsPeriod::Year => "Last year",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            AnalyticsPeriod::Week => 7,
            AnalyticsPeriod::Month => 30,
            AnalyticsPeriod::Quarter => 90,
            AnalyticsPeriod::Year => 365,
        }
    }

    /// Metrics over carts abandoned within the period ending at `now`
    pub fn metrics(&self, carts: &[AbandonedCart], now: DateTime<Utc>) -> CartMetrics {
        CartMetrics::between(carts, now - Duration::days(self.days()), now)
    }
}

impl fmt::Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalyticsPeriod::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown period: {} (expected 7days, 30days, 90days or year)", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

/// Change of a stat against the previous window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatChange {
    /// Magnitude, e.g. "12%"
    pub value: String,
    pub direction: TrendDirection,
    pub period: String,
    /// Signed change; percent for counts and revenue, percentage points for rates
    pub delta: f64,
}

impl StatChange {
    fn from_delta(delta: f64) -> Self {
        Self {
            value: format_percent(delta.abs()),
            direction: if delta < 0.0 {
                TrendDirection::Down
            } else {
                TrendDirection::Up
            },
            period: CHANGE_PERIOD.to_string(),
            delta,
        }
    }

    /// Relative change; growth from zero counts as 100%
    pub fn relative(current: f64, previous: f64) -> Self {
        let delta = if previous == 0.0 {
            if current == 0.0 {
                0.0
            } else {
                100.0
            }
        } else {
            (current - previous) / previous * 100.0
        };
        Self::from_delta(delta)
    }

    /// Difference of two percentages, in points
    pub fn points(current: f64, previous: f64) -> Self {
        Self::from_delta(current - previous)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub title: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<StatChange>,
}

/// The four headline cards: this window's values and their change vs. the previous window
pub fn dashboard_cards(carts: &[AbandonedCart], now: DateTime<Utc>) -> Vec<StatCard> {
    let window = Duration::days(COMPARISON_WINDOW_DAYS);
    let current = CartMetrics::between(carts, now - window, now);
    let previous = CartMetrics::between(carts, now - window - window, now - window);

    vec![
        StatCard {
            title: "Abandoned Carts".to_string(),
            value: format_count(current.total_carts),
            change: Some(StatChange::relative(
                current.total_carts as f64,
                previous.total_carts as f64,
            )),
        },
        StatCard {
            title: "Recovery Rate".to_string(),
            value: format_percent(current.recovery_rate),
            change: Some(StatChange::points(current.recovery_rate, previous.recovery_rate)),
        },
        StatCard {
            title: "Revenue Recovered".to_string(),
            value: format_currency_whole(current.revenue_recovered),
            change: Some(StatChange::relative(
                current.revenue_recovered,
                previous.revenue_recovered,
            )),
        },
        StatCard {
            title: "Email Open Rate".to_string(),
            value: format_percent(current.email_open_rate),
            change: Some(StatChange::points(current.email_open_rate, previous.email_open_rate)),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub name: String,
    pub abandoned: u64,
    pub recovered: u64,
}

/// Abandoned and recovered carts per calendar month, oldest first
///
/// Covers the `months` months ending with the month of `now`; months without
/// carts are included with zero counts.
pub fn monthly_trend(carts: &[AbandonedCart], now: DateTime<Utc>, months: usize) -> Vec<TrendPoint> {
    let mut keys = Vec::with_capacity(months);
    let (mut year, mut month) = (now.year(), now.month());
    for _ in 0..months {
        keys.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    keys.reverse();

    keys.into_iter()
        .map(|(year, month)| {
            let in_month = carts
                .iter()
                .filter(|c| c.abandoned_at.year() == year && c.abandoned_at.month() == month);

            let mut point = TrendPoint {
                name: MONTH_NAMES[(month - 1) as usize].to_string(),
                abandoned: 0,
                recovered: 0,
            };
            for cart in in_month {
                point.abandoned += 1;
                if cart.recovered {
                    point.recovered += 1;
                }
            }
            point
        })
        .collect()
}

/// A row of the "Recent Abandoned Carts" table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentCart {
    pub id: Uuid,
    pub customer: String,
    pub value: String,
    pub items: u32,
    pub abandoned: String,
    pub status: RecoveryStatus,
}

impl RecentCart {
    pub fn new(cart: &AbandonedCart, now: DateTime<Utc>) -> Self {
        Self {
            id: cart.id,
            customer: cart.user_email.clone(),
            value: format_currency(cart.cart_value),
            items: cart.item_count(),
            abandoned: humanize_since(cart.abandoned_at, now),
            status: cart.status(),
        }
    }
}

/// Most recently abandoned carts first
pub fn recent_carts(carts: &[AbandonedCart], now: DateTime<Utc>, limit: usize) -> Vec<RecentCart> {
    let mut sorted: Vec<&AbandonedCart> = carts.iter().collect();
    sorted.sort_by(|a, b| b.abandoned_at.cmp(&a.abandoned_at));
    sorted
        .into_iter()
        .take(limit)
        .map(|cart| RecentCart::new(cart, now))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressTier {
    Low,
    Medium,
    High,
}

/// Progress towards a numeric goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub current: f64,
    pub target: f64,
    pub percentage: u32,
    pub tier: ProgressTier,
    pub reached: bool,
}

/// `min(100, round(current / target * 100))`; zero for a non-positive target
pub fn progress_percentage(current: f64, target: f64) -> u32 {
    if !(target > 0.0) || !current.is_finite() {
        return 0;
    }
    (current / target * 100.0).round().clamp(0.0, 100.0) as u32
}

impl Progress {
    pub fn new(current: f64, target: f64) -> Self {
        let percentage = progress_percentage(current, target);
        let tier = match percentage {
            80.. => ProgressTier::High,
            50..=79 => ProgressTier::Medium,
            _ => ProgressTier::Low,
        };
        Self {
            current,
            target,
            percentage,
            tier,
            reached: percentage >= 100,
        }
    }
}
