//! Error types for the domain layer.
//!
//! The taxonomy is intentionally small: local input problems, state
//! conflicts, missing aggregates, and upstream processor trouble. Stale
//! reconciliation facts are not errors at all; they surface as
//! [`super::FactOutcome::Stale`] and are dropped after logging. Poll
//! exhaustion likewise surfaces as an outcome, not an error.

use thiserror::Error;

/// Domain error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed or semantically invalid input. Local, never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate open session or invalid state transition attempted.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced aggregate does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Processor call failed or timed out. Retryable by the pull path.
    #[error("upstream processor unavailable: {0}")]
    Upstream(String),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }

    /// Creates a not-found error for the named resource.
    pub fn not_found(resource: impl Into<String>) -> Self {
        CoreError::NotFound(resource.into())
    }

    /// Creates an upstream error.
    pub fn upstream(message: impl Into<String>) -> Self {
        CoreError::Upstream(message.into())
    }

    /// True if re-attempting the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Upstream(_))
    }
}
