//! POST /functions/v1/send-recovery-email
//!
//! Composes a recovery email for an abandoned cart, hands it to an
//! [`EmailSender`] and records the send on the cart.

use async_trait::async_trait;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::envelope::Envelope;
use super::error::FunctionResult;
use super::FunctionsState;
use crate::analytics::format::format_currency;
use crate::services::validate;
use crate::store::{CartItem, CartPatch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryEmailRequest {
    pub cart_id: Uuid,
    pub user_email: String,
    pub cart_value: f64,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

/// A rendered recovery email
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

impl RecoveryEmail {
    pub fn compose(request: &RecoveryEmailRequest) -> Self {
        let code = request
            .discount_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let subject = match code {
            Some(code) => format!("Your cart is waiting - use {} at checkout", code),
            None => "You left something in your cart".to_string(),
        };
        let total = format_currency(request.cart_value);

        let mut text = String::from("We noticed you left some items in your cart.\n\n");
        let mut rows = String::new();
        for item in &request.items {
            let line = format_currency(item.line_total());
            let _ = writeln!(text, "- {} x{} ({})", item.name, item.quantity, line);
            let _ = write!(
                rows,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&item.name),
                item.quantity,
                line
            );
        }
        let _ = writeln!(text, "\nCart total: {}", total);
        if let Some(code) = code {
            let _ = writeln!(text, "Use code {} to complete your purchase.", code);
        }

        let discount = code
            .map(|c| format!("<p>Use code <strong>{}</strong> to complete your purchase.</p>", escape_html(c)))
            .unwrap_or_default();
        let html = format!(
            "<html><body><h1>{}</h1><p>We noticed you left some items in your cart.</p>\
             <table>{}</table><p>Cart total: <strong>{}</strong></p>{}</body></html>",
            escape_html(&subject),
            rows,
            total,
            discount
        );

        Self {
            to: request.user_email.clone(),
            subject,
            text,
            html,
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to send recovery email: {0}")]
pub struct DeliveryError(pub String);

/// Email delivery seam
#[async_trait]
pub trait EmailSender: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: &RecoveryEmail) -> Result<(), DeliveryError>;
}

/// Logs the email instead of sending it
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedSender;

#[async_trait]
impl EmailSender for SimulatedSender {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn send(&self, email: &RecoveryEmail) -> Result<(), DeliveryError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Simulated recovery email");
        Ok(())
    }
}

pub async fn send_recovery_email(
    State(state): State<Arc<FunctionsState>>,
    payload: Result<Json<RecoveryEmailRequest>, JsonRejection>,
) -> FunctionResult<Json<Envelope>> {
    let Json(request) = payload?;

    tracing::info!(
        cart_id = %request.cart_id,
        user_email = %request.user_email,
        "Processing recovery email"
    );

    validate::email(&request.user_email)?;
    validate::amount("cartValue", request.cart_value)?;
    validate::items(&request.items)?;

    state.store.get_cart(request.cart_id).await?;

    let email = RecoveryEmail::compose(&request);
    state.mailer.send(&email).await?;

    state
        .store
        .update_cart(request.cart_id, &CartPatch::email_sent(Utc::now()))
        .await?;

    tracing::info!(
        cart_id = %request.cart_id,
        sender = state.mailer.name(),
        "Recovery email sent successfully"
    );
    Ok(Json(Envelope::ok("Recovery email sent successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: Option<&str>) -> RecoveryEmailRequest {
        RecoveryEmailRequest {
            cart_id: Uuid::new_v4(),
            user_email: "emily.davis@example.com".to_string(),
            cart_value: 359.98,
            items: vec![CartItem::new("p6", "Fitness <Smartwatch>", 179.99, 2)],
            discount_code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_compose_without_code() {
        let email = RecoveryEmail::compose(&request(None));
        assert_eq!(email.to, "emily.davis@example.com");
        assert_eq!(email.subject, "You left something in your cart");
        assert!(email.text.contains("Fitness <Smartwatch> x2 ($359.98)"));
        assert!(email.text.contains("Cart total: $359.98"));
        assert!(email.html.contains("Fitness &lt;Smartwatch&gt;"));
        assert!(!email.text.contains("Use code"));
    }

    #[test]
    fn test_compose_with_code() {
        let email = RecoveryEmail::compose(&request(Some("SAVE10")));
        assert!(email.subject.contains("SAVE10"));
        assert!(email.text.contains("Use code SAVE10"));
        assert!(email.html.contains("<strong>SAVE10</strong>"));

        let blank = RecoveryEmail::compose(&request(Some("  ")));
        assert_eq!(blank.subject, "You left something in your cart");
    }

    #[test]
    fn test_request_uses_camel_case() {
        let json = serde_json::json!({
            "cartId": Uuid::nil(),
            "userEmail": "a@example.com",
            "cartValue": 10.0,
            "items": [{"id": "p1", "name": "TV", "price": 10.0, "quantity": 1}],
        });
        let parsed: RecoveryEmailRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert!(parsed.discount_code.is_none());
    }
}
