//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A job status string is not part of the job lifecycle.
    #[error("unknown job status: {0}")]
    UnknownStatus(String),

    /// A job status change is not allowed by the job state machine.
    #[error("illegal job transition: {from} -> {to}")]
    IllegalTransition {
        /// Status the job is currently in.
        from: String,
        /// Status that was requested.
        to: String,
    },

    /// A view name could not be parsed.
    #[error("unknown view: {0}")]
    UnknownView(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// A caller-correctable problem with a submission, detected before any
/// network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation failed: {reason}")]
pub struct ValidationError {
    /// Human-readable reason, suitable for display.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
