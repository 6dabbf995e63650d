//! # AppError
//!
//! Centralized error handling for the Rusty-Inbox ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all ri-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Message)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty message, oversized reply)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing, invalid, expired or revoked operator session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Persistence failure (e.g., DB down, store timeout)
    #[error("store error: {0}")]
    Store(String),

    /// The credential check itself is broken (e.g., bad reference hash).
    /// Distinct from a wrong secret, which is not an error.
    #[error("authentication unavailable: {0}")]
    Auth(String),
}

impl AppError {
    pub fn message_not_found(id: impl ToString) -> Self {
        AppError::NotFound("Message".to_string(), id.to_string())
    }
}

/// A specialized Result type for Rusty-Inbox logic.
pub type Result<T> = std::result::Result<T, AppError>;
