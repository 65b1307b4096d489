//! POST /functions/v1/process-payment
//!
//! Charges a recovered cart through a [`PaymentProcessor`], marks the cart
//! recovered and opens a `recovery` subscription for the customer.

use async_trait::async_trait;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::envelope::Envelope;
use super::error::FunctionResult;
use super::FunctionsState;
use crate::services::validate;
use crate::store::{CartPatch, NewSubscription};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const RECOVERY_PLAN: &str = "recovery";
pub const ACTIVE_STATUS: &str = "active";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub cart_id: Uuid,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: String,
    pub customer_email: String,
}

/// Confirmation returned by a processor
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub reference: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Error)]
#[error("Payment processing failed: {0}")]
pub struct PaymentDeclined(pub String);

/// Payment provider seam
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    fn name(&self) -> &str;

    async fn charge(&self, request: &PaymentRequest) -> Result<Charge, PaymentDeclined>;
}

/// Approves every charge
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedProcessor;

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn charge(&self, request: &PaymentRequest) -> Result<Charge, PaymentDeclined> {
        Ok(Charge {
            reference: format!("sim_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }
}

pub async fn process_payment(
    State(state): State<Arc<FunctionsState>>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> FunctionResult<Json<Envelope>> {
    let Json(request) = payload?;

    tracing::info!(
        cart_id = %request.cart_id,
        amount = request.amount,
        currency = %request.currency,
        "Processing payment"
    );

    validate::email(&request.customer_email)?;
    validate::amount("amount", request.amount)?;

    // Unknown carts fail before anything is charged
    state.store.get_cart(request.cart_id).await?;

    let charge = state.payments.charge(&request).await?;
    tracing::debug!(
        processor = state.payments.name(),
        reference = %charge.reference,
        "Charge approved"
    );

    state
        .store
        .update_cart(request.cart_id, &CartPatch::recovered())
        .await?;

    state
        .store
        .insert_subscription(NewSubscription {
            user_email: request.customer_email.clone(),
            plan_type: RECOVERY_PLAN.to_string(),
            amount: charge.amount,
            status: ACTIVE_STATUS.to_string(),
            expires_at: Utc::now() + Duration::days(state.subscription_days),
        })
        .await?;

    tracing::info!(cart_id = %request.cart_id, "Payment processed successfully");
    Ok(Json(Envelope::ok("Payment processed successfully")))
}
