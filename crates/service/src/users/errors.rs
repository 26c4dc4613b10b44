use thiserror::Error;

use crate::errors::ServiceError;

/// Outcomes of user store operations other than success.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("this email has already been registered")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("invalid email or password")]
    PasswordMismatch,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error(transparent)]
    Storage(#[from] ServiceError),
}

impl UserError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            UserError::Validation(_) => 1001,
            UserError::Conflict => 1002,
            UserError::NotFound => 1003,
            UserError::PasswordMismatch => 1004,
            UserError::HashError(_) => 1101,
            UserError::Storage(_) => 1200,
        }
    }
}
