//! Demo data
//!
//! Seed carts and campaigns for an empty dashboard. Cart generation takes the
//! caller's random number generator so results can be reproduced with a
//! seeded one.

use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::store::{CampaignStatus, CartItem, NewAbandonedCart, NewRecoveryCampaign};

/// Catalogue entry used for demo carts
#[derive(Debug, Clone, Copy)]
pub struct DemoProduct {
    pub id: &'static str,
    pub name: &'static str,
    pub price: f64,
}

const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

pub const PRODUCTS: [DemoProduct; 8] = [
    DemoProduct { id: "p1", name: "Ultra HD Smart TV", price: 699.99 },
    DemoProduct { id: "p2", name: "Wireless Noise-Canceling Headphones", price: 249.99 },
    DemoProduct { id: "p3", name: "Smart Home Speaker", price: 129.99 },
    DemoProduct { id: "p4", name: "Smartphone Pro Max", price: 1099.99 },
    DemoProduct { id: "p5", name: "Gaming Console", price: 499.99 },
    DemoProduct { id: "p6", name: "Fitness Smartwatch", price: 199.99 },
    DemoProduct { id: "p7", name: "Wireless Earbuds", price: 159.99 },
    DemoProduct { id: "p8", name: "Tablet Pro", price: 799.99 },
];

pub const EMAILS: [&str; 8] = [
    "john.doe@example.com",
    "jane.smith@example.com",
    "robert.johnson@example.com",
    "sarah.williams@example.com",
    "michael.brown@example.com",
    "emily.davis@example.com",
    "david.miller@example.com",
    "emma.wilson@example.com",
];

/// Carts created when a demo request names no count
pub const DEFAULT_DEMO_CARTS: usize = 10;

/// Largest batch a single demo request may create
pub const MAX_DEMO_CARTS: usize = 1000;

const ABANDONED_WITHIN_DAYS: i64 = 30;
const EMAIL_SENT_WITHIN_DAYS: i64 = 15;
const RECOVERED_PROBABILITY: f64 = 0.3;
const EMAIL_SENT_PROBABILITY: f64 = 0.7;
const EMAIL_OPENED_PROBABILITY: f64 = 0.5;

fn days_ago<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, within: i64) -> DateTime<Utc> {
    now - Duration::days(rng.random_range(0..within))
}

/// 1 to 4 distinct catalogue products, each with quantity 1 to 3
pub fn random_items<R: Rng + ?Sized>(rng: &mut R) -> Vec<CartItem> {
    let count = rng.random_range(1..=4);
    PRODUCTS
        .choose_multiple(rng, count)
        .collect::<Vec<_>>()
        .into_iter()
        .map(|product| {
            let mut item = CartItem::new(
                product.id,
                product.name,
                product.price,
                rng.random_range(1..=3),
            );
            item.image = Some(PLACEHOLDER_IMAGE.to_string());
            item
        })
        .collect()
}

/// One random abandoned cart relative to `now`
pub fn demo_cart<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> NewAbandonedCart {
    let items = random_items(rng);
    let email = EMAILS.choose(rng).copied().unwrap_or(EMAILS[0]);
    let abandoned_at = days_ago(rng, now, ABANDONED_WITHIN_DAYS);

    let recovered = rng.random_bool(RECOVERED_PROBABILITY);
    let email_sent = recovered || rng.random_bool(EMAIL_SENT_PROBABILITY);

    let cart = NewAbandonedCart::new(email, items)
        .abandoned_at(abandoned_at)
        .recovered(recovered);

    if email_sent {
        let sent_at = days_ago(rng, now, EMAIL_SENT_WITHIN_DAYS);
        let opened = rng.random_bool(EMAIL_OPENED_PROBABILITY);
        cart.email_sent(sent_at, opened)
    } else {
        cart
    }
}

pub fn demo_carts<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<NewAbandonedCart> {
    (0..count).map(|_| demo_cart(rng, now)).collect()
}

/// The three stock recovery campaigns
pub fn demo_campaigns() -> Vec<NewRecoveryCampaign> {
    vec![
        NewRecoveryCampaign::new("Welcome Back - 10% Discount", CampaignStatus::Active)
            .channel("Email")
            .trigger("1 hour after abandonment")
            .template("subject", "Don't miss out on your items!")
            .template(
                "body",
                "We noticed you left some items in your cart. Here's a 10% discount to complete your purchase!",
            ),
        NewRecoveryCampaign::new("Last Chance - 15% Discount", CampaignStatus::Active)
            .channel("Email")
            .channel("SMS")
            .trigger("24 hours after abandonment")
            .trigger("48 hours after abandonment")
            .template("subject", "Last chance to complete your purchase!")
            .template(
                "body",
                "Your items are still waiting for you. Complete your purchase with a 15% discount!",
            ),
        NewRecoveryCampaign::new("VIP Recovery - 20% Discount", CampaignStatus::Draft)
            .channel("Email")
            .channel("SMS")
            .channel("WhatsApp")
            .trigger("4 hours after abandonment")
            .trigger("1 day after abandonment")
            .trigger("3 days after abandonment")
            .template("subject", "VIP Offer Just For You")
            .template(
                "body",
                "As a valued customer, we're offering you a special 20% discount on your cart items!",
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_carts_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();

        for cart in demo_carts(&mut rng, 200, now) {
            assert!((1..=4).contains(&cart.items.len()));

            let ids: HashSet<_> = cart.items.iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids.len(), cart.items.len(), "products must be distinct");

            for item in &cart.items {
                assert!((1..=3).contains(&item.quantity));
            }

            let sum: f64 = cart.items.iter().map(|i| i.price * i.quantity as f64).sum();
            assert!((cart.cart_value - sum).abs() < 1e-9);

            assert!(EMAILS.contains(&cart.user_email.as_str()));
            assert!(cart.abandoned_at <= now);
            assert!(cart.abandoned_at > now - Duration::days(ABANDONED_WITHIN_DAYS));

            if cart.recovered {
                assert!(cart.recovery_email_sent);
            }
            match cart.recovery_email_sent_at {
                Some(at) => {
                    assert!(cart.recovery_email_sent);
                    assert!(at > now - Duration::days(EMAIL_SENT_WITHIN_DAYS));
                }
                None => {
                    assert!(!cart.recovery_email_sent);
                    assert!(!cart.recovery_email_opened);
                }
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let now = Utc::now();
        let a = demo_carts(&mut StdRng::seed_from_u64(42), 5, now);
        let b = demo_carts(&mut StdRng::seed_from_u64(42), 5, now);
        assert_eq!(a, b);
    }

    #[test]
    fn test_demo_campaigns() {
        let campaigns = demo_campaigns();
        assert_eq!(campaigns.len(), 3);
        assert_eq!(campaigns[0].name, "Welcome Back - 10% Discount");
        assert_eq!(campaigns[1].time_triggers.len(), 2);
        assert_eq!(campaigns[2].status, CampaignStatus::Draft);
        assert_eq!(campaigns[2].channels, vec!["Email", "SMS", "WhatsApp"]);
        assert_eq!(
            campaigns[2].message_templates["subject"],
            serde_json::json!("VIP Offer Just For You")
        );
    }
}
