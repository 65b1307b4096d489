//! Data-access services
//!
//! Thin create/read/update wrappers over the store. Each call either
//! succeeds and publishes a success notice, or fails: the failure is logged,
//! a destructive notice is published and the error is returned. Nothing is
//! retried and no state changes on failure.

mod campaigns;
mod carts;
mod error;
mod notify;
pub mod validate;

pub use campaigns::CampaignService;
pub use carts::CartService;
pub use error::{ServiceError, ServiceResult};
pub use notify::{NoopNotifier, Notice, NoticeVariant, Notifier};

#[cfg(test)]
pub(crate) use notify::testing;

/// Log a failed call and publish it as a destructive notice
fn report(notifier: &dyn Notifier, title: &str, error: ServiceError) -> ServiceError {
    tracing::error!(error = %error, "{}", title);
    notifier.notify(Notice::destructive(title, error.to_string()));
    error
}
