//! Function endpoints
//!
//! Two standalone JSON endpoints mounted under `/functions/v1`:
//!
//! - `POST /functions/v1/process-payment`
//! - `POST /functions/v1/send-recovery-email`
//!
//! Both answer with an [`Envelope`]: `{"success": true, "message": ...}` on
//! success, or status 500 with `{"success": false, "error": ...}` on any
//! failure, malformed bodies included. CORS preflight is answered for any
//! origin.

mod envelope;
mod error;
pub mod payment;
pub mod recovery_email;

pub use envelope::Envelope;
pub use error::{FunctionError, FunctionResult};
pub use payment::{Charge, PaymentDeclined, PaymentProcessor, PaymentRequest, SimulatedProcessor};
pub use recovery_email::{
    DeliveryError, EmailSender, RecoveryEmail, RecoveryEmailRequest, SimulatedSender,
};

use axum::{
    http::{header, HeaderName, Method},
    routing::post,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::store::Store;

/// Default lifetime of a subscription opened by a payment
pub const DEFAULT_SUBSCRIPTION_DAYS: i64 = 30;

/// Dependencies of the function endpoints
pub struct FunctionsState {
    pub store: Arc<Store>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub mailer: Arc<dyn EmailSender>,
    pub subscription_days: i64,
}

impl FunctionsState {
    /// State with the simulated processor and sender
    pub fn simulated(store: Arc<Store>) -> Self {
        Self {
            store,
            payments: Arc::new(SimulatedProcessor),
            mailer: Arc::new(SimulatedSender),
            subscription_days: DEFAULT_SUBSCRIPTION_DAYS,
        }
    }
}

/// Allow any origin with the headers hosted clients send
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Routes under `/functions/v1`
pub fn router(state: Arc<FunctionsState>) -> Router {
    let routes = Router::new()
        .route("/process-payment", post(payment::process_payment))
        .route("/send-recovery-email", post(recovery_email::send_recovery_email))
        .layer(cors_layer())
        .with_state(state);

    Router::new().nest("/functions/v1", routes)
}
