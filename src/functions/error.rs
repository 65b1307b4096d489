use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::envelope::Envelope;
use super::payment::PaymentDeclined;
use super::recovery_email::DeliveryError;
use crate::services::ServiceError;
use crate::store::StoreError;

/// Failure of a function endpoint; always rendered as a 500 envelope
#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("Invalid request body: {0}")]
    Body(String),

    #[error(transparent)]
    Validation(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentDeclined),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl From<JsonRejection> for FunctionError {
    fn from(rejection: JsonRejection) -> Self {
        FunctionError::Body(rejection.body_text())
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::error!(error = %message, "Function failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::failure(message))).into_response()
    }
}

pub type FunctionResult<T> = Result<T, FunctionError>;
