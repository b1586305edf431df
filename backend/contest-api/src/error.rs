//! Error taxonomy shared by the store, delivery and service layers.
//!
//! Nothing here knows about HTTP; `handlers::ApiError` maps these onto
//! status codes.

use thiserror::Error;

/// Failure of a persistence call. The cause is kept for logging.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure to hand a materialized problem set to the judge side.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to serialize problem set: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("problem set delivery failed: {0}")]
    DeliveryFailure(#[from] DeliveryError),

    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::InvalidInput(errors.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
pub type StoreResult<T> = Result<T, StoreError>;
