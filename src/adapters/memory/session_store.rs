//! In-memory session store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{CoreError, Timestamp};
use crate::domain::session::{ExternalSession, SessionKey};
use crate::ports::SessionStore;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, ExternalSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find(&self, key: &SessionKey) -> Result<Option<ExternalSession>, CoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn put(&self, session: &ExternalSession) -> Result<(), CoreError> {
        self.sessions
            .write()
            .await
            .insert(session.key, session.clone());
        Ok(())
    }

    async fn mark_consumed(&self, key: &SessionKey) -> Result<(), CoreError> {
        if let Some(session) = self.sessions.write().await.get_mut(key) {
            session.consumed = true;
        }
        Ok(())
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, CoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at.is_after(&now));
        Ok((before - sessions.len()) as u64)
    }
}
