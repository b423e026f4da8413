//! In-memory idempotency ledger.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{CoreError, Timestamp};
use crate::ports::{ProcessedEventRecord, ProcessedEventStore, SaveResult};

#[derive(Default)]
pub struct InMemoryProcessedEventStore {
    records: RwLock<HashMap<String, ProcessedEventRecord>>,
}

impl InMemoryProcessedEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessedEventStore for InMemoryProcessedEventStore {
    async fn find(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<ProcessedEventRecord>, CoreError> {
        Ok(self.records.read().await.get(idempotency_key).cloned())
    }

    async fn save(&self, record: ProcessedEventRecord) -> Result<SaveResult, CoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.idempotency_key) {
            return Ok(SaveResult::AlreadyExists);
        }
        records.insert(record.idempotency_key.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, CoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.processed_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}
