//! In-memory payout account repository.
//!
//! Backs tests and local development. The version check mirrors what a
//! SQL implementation would do with `WHERE version = $n`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{AccountId, CoreError};
use crate::domain::payout::PayoutAccount;
use crate::ports::AccountRepository;

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<AccountId, PayoutAccount>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, account: &PayoutAccount) -> Result<(), CoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(CoreError::conflict(format!(
                "payout account {} already exists",
                account.id
            )));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &PayoutAccount) -> Result<(), CoreError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get(&account.id)
            .ok_or_else(|| CoreError::not_found(format!("payout account {}", account.id)))?;
        if stored.version != account.version {
            return Err(CoreError::conflict(format!(
                "payout account {} version {} is behind stored {}",
                account.id, account.version, stored.version
            )));
        }
        let mut updated = account.clone();
        updated.version += 1;
        accounts.insert(account.id, updated);
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<PayoutAccount>, CoreError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_account_id: &str,
    ) -> Result<Option<PayoutAccount>, CoreError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.external_account_id.as_deref() == Some(external_account_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn account() -> PayoutAccount {
        PayoutAccount::new(AccountId::new(), "owner@example.com", Timestamp::from_unix(0))
    }

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let repo = InMemoryAccountRepository::new();
        let mut account = account();
        account.attach_external_account("acct_1");
        repo.save(&account).await.unwrap();

        assert!(repo.find_by_id(&account.id).await.unwrap().is_some());
        let by_external = repo.find_by_external_id("acct_1").await.unwrap().unwrap();
        assert_eq!(by_external.id, account.id);
        assert!(repo.find_by_external_id("acct_other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_save_conflicts() {
        let repo = InMemoryAccountRepository::new();
        let account = account();
        repo.save(&account).await.unwrap();
        assert!(matches!(
            repo.save(&account).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_enforces_version_check() {
        let repo = InMemoryAccountRepository::new();
        let account = account();
        repo.save(&account).await.unwrap();

        // First writer wins and bumps the version.
        repo.update(&account).await.unwrap();
        assert_eq!(repo.find_by_id(&account.id).await.unwrap().unwrap().version, 1);

        // Second writer still holds version 0.
        assert!(matches!(
            repo.update(&account).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_of_missing_account_is_not_found() {
        let repo = InMemoryAccountRepository::new();
        assert!(matches!(
            repo.update(&account()).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
