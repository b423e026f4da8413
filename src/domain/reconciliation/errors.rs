//! Errors raised while handling processor webhooks, with HTTP status
//! mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::CoreError;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the replay window.
    #[error("timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is in the future beyond clock-skew tolerance.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// Malformed signature header or payload.
    #[error("parse error: {0}")]
    Parse(String),

    /// Payload is missing a field the handler needs.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The aggregate the event references does not exist yet. Often
    /// eventual consistency: the webhook raced our own write.
    #[error("{0} not found")]
    SubjectNotFound(&'static str),

    /// Persistence failed, including exhausted optimistic-lock retries.
    #[error("storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Whether the processor should redeliver the event.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Storage(_) | WebhookError::SubjectNotFound(_)
        )
    }

    /// The processor retries on 5xx only; auth and parse failures get a
    /// terminal 4xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::InvalidTimestamp
            | WebhookError::Parse(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,
            WebhookError::SubjectNotFound(_) | WebhookError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<CoreError> for WebhookError {
    fn from(err: CoreError) -> Self {
        WebhookError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_terminal_unauthorized() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn parse_failures_are_terminal_bad_request() {
        let err = WebhookError::Parse("bad json".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());

        let err = WebhookError::MissingField("subscription");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_subject_retries_for_eventual_consistency() {
        let err = WebhookError::SubjectNotFound("team");
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn storage_failures_retry() {
        let err: WebhookError = CoreError::conflict("version mismatch").into();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
