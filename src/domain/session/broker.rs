//! Session broker: one live processor session per (purpose, subject).
//!
//! Hosted sessions are single-use and short-lived. Handing a caller two
//! live onboarding links for the same account wastes processor calls and
//! confuses the return-flow. The broker checks for a live session first
//! and only mints a new one when the stored one is missing, consumed, or
//! expired.

use std::future::Future;
use std::sync::Arc;

use crate::domain::foundation::{CoreError, Timestamp};
use crate::domain::session::{ExternalSession, SessionKey};
use crate::ports::{Clock, IssuedSession, ProcessorError, SessionStore};

pub struct SessionBroker {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionBroker {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the live session for `key`, minting one via `issue` when
    /// none is live.
    ///
    /// Check-then-act: a race between two callers can mint two sessions,
    /// in which case the second `put` wins and the first link still works
    /// until consumed. Both links are valid at the processor; storage just
    /// remembers the newer one.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: SessionKey,
        issue: F,
    ) -> Result<ExternalSession, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IssuedSession, ProcessorError>>,
    {
        let now = self.clock.now();
        if let Some(existing) = self.store.find(&key).await? {
            if existing.is_live(now) {
                tracing::debug!(session_key = %key, "reusing live processor session");
                return Ok(existing);
            }
        }

        let issued = issue().await?;
        let session = ExternalSession {
            key,
            url: issued.url,
            external_ref: issued.external_ref,
            issued_at: now,
            expires_at: issued
                .expires_at
                .unwrap_or_else(|| now.plus_minutes(key.purpose.fallback_ttl_minutes())),
            consumed: false,
        };
        self.store.put(&session).await?;
        tracing::info!(session_key = %key, external_ref = %session.external_ref, "minted processor session");
        Ok(session)
    }

    /// Marks the session for `key` consumed. Safe to call on return-flow
    /// redeliveries; repeats are no-ops.
    pub async fn consume(&self, key: &SessionKey) -> Result<(), CoreError> {
        self.store.mark_consumed(key).await
    }

    /// Drops expired sessions from storage.
    pub async fn purge_expired(&self) -> Result<u64, CoreError> {
        self.store.purge_expired(self.clock.now()).await
    }
}
