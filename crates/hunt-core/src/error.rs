//! Service-level errors.

use crate::db::DbError;
use thiserror::Error;

/// Errors returned by the claim-attempt and redemption services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The request is malformed or names an unknown option.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Too many recent failed claim attempts.
    #[error("Too many failed claim attempts, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Persistence failure.
    #[error(transparent)]
    Database(#[from] DbError),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<crate::claim::UnknownClearPolicy> for ServiceError {
    fn from(err: crate::claim::UnknownClearPolicy) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}
