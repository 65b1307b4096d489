//! API Routes
//!
//! Route handlers organized by functionality.

pub mod analytics;
pub mod campaigns;
pub mod carts;
pub mod dashboard;
pub mod demo;
pub mod discounts;
pub mod feedback;
pub mod health;
