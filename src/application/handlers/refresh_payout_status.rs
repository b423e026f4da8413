//! Read and refresh an organizer's payout status.
//!
//! Backs the onboarding return-flow: the browser lands, triggers a
//! bounded poll, and renders whatever state reconciliation has converged
//! on.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::eligibility::{needs_payout_onboarding, PayoutRemediation};
use crate::domain::foundation::{AccountId, CoreError, Timestamp};
use crate::domain::payout::{ConnectStatus, PayoutStatus};
use crate::domain::reconciliation::{CancelSignal, PollOutcome, ReconciliationService, StatusPoller};
use crate::ports::AccountRepository;

/// Snapshot of an account's payout standing.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutStatusView {
    pub account_id: AccountId,
    pub payout_status: PayoutStatus,
    pub connect_status: ConnectStatus,
    pub remediation: Option<PayoutRemediation>,
    pub last_synced_at: Option<Timestamp>,
}

pub struct PayoutStatusHandler {
    accounts: Arc<dyn AccountRepository>,
    reconciliation: Arc<ReconciliationService>,
    poller: Arc<StatusPoller>,
}

impl PayoutStatusHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        reconciliation: Arc<ReconciliationService>,
        poller: Arc<StatusPoller>,
    ) -> Self {
        Self {
            accounts,
            reconciliation,
            poller,
        }
    }

    pub async fn status(&self, account_id: &AccountId) -> Result<PayoutStatusView, CoreError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("payout account {account_id}")))?;
        Ok(PayoutStatusView {
            account_id: account.id,
            payout_status: account.payout_status,
            connect_status: account.connect_status,
            remediation: needs_payout_onboarding(&account),
            last_synced_at: account.last_synced_at,
        })
    }

    /// One-shot pull from the processor, then the refreshed view.
    pub async fn refresh(&self, account_id: &AccountId) -> Result<PayoutStatusView, CoreError> {
        self.reconciliation.refresh_account(account_id).await?;
        self.status(account_id).await
    }

    /// Bounded poll for the return-flow. Returns the poll outcome and the
    /// final view; a timeout is a normal result here.
    pub async fn poll(
        &self,
        account_id: &AccountId,
        cancel: CancelSignal,
    ) -> Result<(PollOutcome, PayoutStatusView), CoreError> {
        let outcome = self.poller.poll_until_enabled(account_id, cancel).await?;
        let view = self.status(account_id).await?;
        Ok((outcome, view))
    }
}
