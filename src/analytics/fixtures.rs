//! Fixed chart series for dashboard panels without a live data source

use serde::Serialize;

/// A labelled percentage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub name: &'static str,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRecovery {
    pub name: &'static str,
    pub recovery: u32,
}

pub fn channel_recovery() -> Vec<ChannelRecovery> {
    [("Email", 43), ("SMS", 29), ("WhatsApp", 18), ("Push", 10)]
        .into_iter()
        .map(|(name, recovery)| ChannelRecovery { name, recovery })
        .collect()
}

pub fn abandonment_reasons() -> Vec<Share> {
    [
        ("Price concerns", 35),
        ("Shipping cost", 25),
        ("Just browsing", 20),
        ("Payment issues", 12),
        ("Website issues", 8),
    ]
    .into_iter()
    .map(|(name, percentage)| Share { name, percentage })
    .collect()
}

pub fn time_spent() -> Vec<Share> {
    [
        ("Under 1m", 15),
        ("1-3m", 30),
        ("3-5m", 25),
        ("5-10m", 20),
        ("10m+", 10),
    ]
    .into_iter()
    .map(|(name, percentage)| Share { name, percentage })
    .collect()
}

/// Percent of sessions reaching a checkout step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStep {
    pub name: &'static str,
    pub completed: u32,
    /// Points lost since the previous step
    pub drop_off: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropOff {
    pub from: &'static str,
    pub to: &'static str,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutFunnel {
    pub steps: Vec<FunnelStep>,
    pub largest_drop_off: Option<DropOff>,
    /// Percent of checkout starts that complete
    pub checkout_completion_rate: u32,
}

const CHECKOUT_START: &str = "Start Checkout";
const CHECKOUT_COMPLETE: &str = "Complete";

impl CheckoutFunnel {
    pub fn new(stages: &[(&'static str, u32)]) -> Self {
        let mut steps = Vec::with_capacity(stages.len());
        let mut largest: Option<DropOff> = None;

        for (i, &(name, completed)) in stages.iter().enumerate() {
            let drop_off = match i.checked_sub(1).map(|p| stages[p]) {
                Some((prev_name, prev)) => {
                    let points = prev.saturating_sub(completed);
                    // First of equal drops wins
                    if largest.as_ref().map_or(true, |d| points > d.points) {
                        largest = Some(DropOff {
                            from: prev_name,
                            to: name,
                            points,
                        });
                    }
                    points
                }
                None => 0,
            };
            steps.push(FunnelStep {
                name,
                completed,
                drop_off,
            });
        }

        let reached = |label: &str| steps.iter().find(|s| s.name == label).map(|s| s.completed);
        let checkout_completion_rate = match (reached(CHECKOUT_START), reached(CHECKOUT_COMPLETE)) {
            (Some(start), Some(done)) if start > 0 => {
                (done as f64 / start as f64 * 100.0).round() as u32
            }
            _ => 0,
        };

        Self {
            steps,
            largest_drop_off: largest,
            checkout_completion_rate,
        }
    }
}

pub fn checkout_funnel() -> CheckoutFunnel {
    CheckoutFunnel::new(&[
        ("Add to Cart", 100),
        ("View Cart", 70),
        (CHECKOUT_START, 45),
        ("Add Info", 30),
        ("Payment", 18),
        (CHECKOUT_COMPLETE, 15),
    ])
}

/// Abandonment and recovery rates of a visitor segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitorSegment {
    pub name: &'static str,
    pub abandoned: u32,
    pub recovered: u32,
    /// Recovered as a percent of abandoned
    pub recovery_share: u32,
}

impl VisitorSegment {
    fn new(name: &'static str, abandoned: u32, recovered: u32) -> Self {
        let recovery_share = if abandoned == 0 {
            0
        } else {
            (recovered as f64 / abandoned as f64 * 100.0).round() as u32
        };
        Self {
            name,
            abandoned,
            recovered,
            recovery_share,
        }
    }
}

pub fn visitor_segments() -> Vec<VisitorSegment> {
    vec![
        VisitorSegment::new("New visitors", 68, 22),
        VisitorSegment::new("Returning", 52, 32),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_sum_to_hundred() {
        assert_eq!(abandonment_reasons().iter().map(|s| s.percentage).sum::<u32>(), 100);
        assert_eq!(time_spent().iter().map(|s| s.percentage).sum::<u32>(), 100);
        assert_eq!(channel_recovery().iter().map(|c| c.recovery).sum::<u32>(), 100);
    }

    #[test]
    fn test_checkout_funnel() {
        let funnel = checkout_funnel();
        assert_eq!(funnel.steps.len(), 6);
        assert_eq!(funnel.steps[0].drop_off, 0);
        assert_eq!(funnel.steps[1].drop_off, 30);

        let largest = funnel.largest_drop_off.unwrap();
        assert_eq!(largest.points, 30);
        assert_eq!(largest.from, "Add to Cart");
        assert_eq!(largest.to, "View Cart");

        assert_eq!(funnel.checkout_completion_rate, 33);
    }

    #[test]
    fn test_empty_funnel() {
        let funnel = CheckoutFunnel::new(&[]);
        assert!(funnel.steps.is_empty());
        assert!(funnel.largest_drop_off.is_none());
        assert_eq!(funnel.checkout_completion_rate, 0);
    }

    #[test]
    fn test_visitor_segments() {
        let segments = visitor_segments();
        assert_eq!(segments[0].recovery_share, 32);
        assert_eq!(segments[1].recovery_share, 62);
    }
}
