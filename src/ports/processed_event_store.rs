//! Store of processor events that have already been handled.
//!
//! The processor redelivers webhooks on timeouts, on non-2xx responses,
//! and when our acknowledgment is lost. Recording every handled event by
//! its idempotency key lets the reconciliation path shed duplicates before
//! any aggregate is touched.

use async_trait::async_trait;

use crate::domain::foundation::{CoreError, Timestamp};

/// Record of one handled processor event, kept for dedup and auditing.
#[derive(Debug, Clone)]
pub struct ProcessedEventRecord {
    /// Processor event id, the idempotency key (evt_xxx format).
    pub idempotency_key: String,

    /// Raw event type string from the processor.
    pub kind: String,

    /// When the event was handled on our side.
    pub processed_at: Timestamp,

    /// "applied", "stale", "ignored", or "failed".
    pub outcome: String,

    /// Error detail when the outcome is "failed".
    pub error_message: Option<String>,

    /// Original payload, kept for replay investigations.
    pub payload: serde_json::Value,
}

impl ProcessedEventRecord {
    pub fn applied(
        key: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self::with_outcome(key, kind, "applied", None, payload, now)
    }

    pub fn stale(
        key: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self::with_outcome(key, kind, "stale", None, payload, now)
    }

    pub fn ignored(
        key: impl Into<String>,
        kind: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self::with_outcome(key, kind, "ignored", Some(reason.into()), payload, now)
    }

    pub fn failed(
        key: impl Into<String>,
        kind: impl Into<String>,
        error: impl Into<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self::with_outcome(key, kind, "failed", Some(error.into()), payload, now)
    }

    fn with_outcome(
        key: impl Into<String>,
        kind: impl Into<String>,
        outcome: &str,
        error_message: Option<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self {
            idempotency_key: key.into(),
            kind: kind.into(),
            processed_at: now,
            outcome: outcome.to_string(),
            error_message,
            payload,
        }
    }
}

/// Result of attempting to record a handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time this key has been seen.
    Inserted,
    /// Another delivery of the same event won the race.
    AlreadyExists,
}

/// Port for the idempotency ledger.
///
/// Implementations must make `save` atomic on the idempotency key so two
/// concurrent deliveries of the same event cannot both observe `Inserted`.
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Look up a previously handled event by its idempotency key.
    async fn find(&self, idempotency_key: &str)
        -> Result<Option<ProcessedEventRecord>, CoreError>;

    /// Record a handled event, first writer wins.
    async fn save(&self, record: ProcessedEventRecord) -> Result<SaveResult, CoreError>;

    /// Drop records handled before the cutoff. Returns how many were
    /// removed.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_constructors_set_outcome() {
        let now = Timestamp::from_unix(1_000);
        let applied =
            ProcessedEventRecord::applied("evt_1", "account.updated", serde_json::json!({}), now);
        assert_eq!(applied.outcome, "applied");
        assert!(applied.error_message.is_none());

        let failed = ProcessedEventRecord::failed(
            "evt_2",
            "invoice.payment_failed",
            "no team for subscription",
            serde_json::json!({}),
            now,
        );
        assert_eq!(failed.outcome, "failed");
        assert_eq!(
            failed.error_message.as_deref(),
            Some("no team for subscription")
        );
    }

    #[test]
    fn processed_event_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ProcessedEventStore) {}
    }
}
