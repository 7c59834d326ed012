//! Domain errors shared by the stores and the lifecycle manager.

use thiserror::Error;

use crate::db::RequestStatus;

pub type MarketResult<T> = Result<T, MarketError>;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("Cannot move request {id} from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("System account has not been seeded")]
    SystemAccountMissing,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl MarketError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
