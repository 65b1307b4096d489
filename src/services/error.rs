use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the cart and campaign services
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Store(e) if e.is_not_found())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
