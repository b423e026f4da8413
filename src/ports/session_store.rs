//! Storage port for brokered processor sessions.

use async_trait::async_trait;

use crate::domain::foundation::{CoreError, Timestamp};
use crate::domain::session::{ExternalSession, SessionKey};

/// Keeps at most one session per key. The broker's check-then-act relies
/// on `put` replacing whatever was stored under the key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored session for a key, live or not.
    async fn find(&self, key: &SessionKey) -> Result<Option<ExternalSession>, CoreError>;

    async fn put(&self, session: &ExternalSession) -> Result<(), CoreError>;

    /// Mark the stored session consumed. A key with no stored session, or
    /// one already consumed, is a no-op; first writer wins.
    async fn mark_consumed(&self, key: &SessionKey) -> Result<(), CoreError>;

    /// Remove sessions whose expiry is at or before `now`. Returns how
    /// many were removed.
    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SessionStore) {}
    }
}
