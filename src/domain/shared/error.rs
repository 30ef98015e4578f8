//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid call event: {0}")]
    InvalidCallEvent(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
