//! Request validation shared by services and function endpoints

use super::error::{ServiceError, ServiceResult};
use crate::demo::MAX_DEMO_CARTS;
use crate::store::{CartItem, NewAbandonedCart, NewRecoveryCampaign};

fn invalid<T>(message: impl Into<String>) -> ServiceResult<T> {
    Err(ServiceError::Validation(message.into()))
}

pub fn email(value: &str) -> ServiceResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return invalid("email must not be empty");
    }
    if !value.contains('@') {
        return invalid(format!("'{}' is not an email address", value));
    }
    Ok(())
}

pub fn amount(field: &str, value: f64) -> ServiceResult<()> {
    if !value.is_finite() || value < 0.0 {
        return invalid(format!("{} must be a non-negative number", field));
    }
    Ok(())
}

pub fn items(items: &[CartItem]) -> ServiceResult<()> {
    for item in items {
        amount("item price", item.price)?;
        if item.quantity == 0 {
            return invalid(format!("item '{}' has zero quantity", item.id));
        }
    }
    Ok(())
}

pub fn new_cart(cart: &NewAbandonedCart) -> ServiceResult<()> {
    email(&cart.user_email)?;
    amount("cart_value", cart.cart_value)?;
    items(&cart.items)
}

pub fn new_campaign(campaign: &NewRecoveryCampaign) -> ServiceResult<()> {
    if campaign.name.trim().is_empty() {
        return invalid("campaign name must not be empty");
    }
    Ok(())
}

pub fn demo_count(count: usize) -> ServiceResult<()> {
    if count == 0 || count > MAX_DEMO_CARTS {
        return invalid(format!("count must be between 1 and {}", MAX_DEMO_CARTS));
    }
    Ok(())
}
