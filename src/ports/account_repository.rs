//! Persistence port for [`PayoutAccount`] aggregates.

use async_trait::async_trait;

use crate::domain::foundation::{AccountId, CoreError};
use crate::domain::payout::PayoutAccount;

/// Repository for payout account persistence.
///
/// `update` is a compare-and-swap on `version`: implementations must fail
/// with `Conflict` when the stored version no longer matches, so a slow
/// reconciliation never clobbers a newer write.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account. Fails with `Conflict` if the id is taken.
    async fn save(&self, account: &PayoutAccount) -> Result<(), CoreError>;

    /// Persist changes to an existing account, bumping its version.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `Conflict` if `account.version` is behind the stored version
    async fn update(&self, account: &PayoutAccount) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<PayoutAccount>, CoreError>;

    /// Look up by the processor's connected-account id (acct_xxx). This is
    /// how account webhooks find their aggregate.
    async fn find_by_external_id(
        &self,
        external_account_id: &str,
    ) -> Result<Option<PayoutAccount>, CoreError>;
}
