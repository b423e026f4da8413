//! Mock processor gateway for tests.
//!
//! Keeps a small in-memory picture of connected accounts and counts the
//! calls made against it, so tests can assert poll and broker behavior
//! without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    AccountSnapshot, CheckoutRequest, IssuedSession, ProcessorError, ProcessorGateway,
};

#[derive(Clone, Copy, Default)]
struct MockAccountState {
    charges_enabled: bool,
    payouts_enabled: bool,
    details_submitted: bool,
    disqualified: bool,
}

#[derive(Default)]
pub struct MockProcessorGateway {
    accounts: Mutex<HashMap<String, MockAccountState>>,
    next_error: Mutex<Option<ProcessorError>>,
    fetches: AtomicU32,
    sessions_minted: AtomicU32,
}

impl MockProcessorGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state `fetch_account` reports for a connected account.
    pub fn set_account_state(
        &self,
        external_account_id: &str,
        charges_enabled: bool,
        payouts_enabled: bool,
        details_submitted: bool,
        disqualified: bool,
    ) {
        self.accounts.lock().unwrap().insert(
            external_account_id.to_string(),
            MockAccountState {
                charges_enabled,
                payouts_enabled,
                details_submitted,
                disqualified,
            },
        );
    }

    /// Injects an error returned by the next call.
    pub fn fail_next(&self, error: ProcessorError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn sessions_minted(&self) -> u32 {
        self.sessions_minted.load(Ordering::SeqCst)
    }

    fn take_error(&self) -> Option<ProcessorError> {
        self.next_error.lock().unwrap().take()
    }

    fn mint(&self, prefix: &str) -> IssuedSession {
        let n = self.sessions_minted.fetch_add(1, Ordering::SeqCst);
        IssuedSession {
            url: format!("https://mock.processor.test/{prefix}/{n}"),
            external_ref: format!("{prefix}_{n}"),
            expires_at: Some(Timestamp::now().plus_minutes(30)),
        }
    }
}

#[async_trait]
impl ProcessorGateway for MockProcessorGateway {
    async fn create_account(&self, _email: &str) -> Result<String, ProcessorError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        let n = self.accounts.lock().unwrap().len();
        let id = format!("acct_mock_{n}");
        self.accounts
            .lock()
            .unwrap()
            .insert(id.clone(), MockAccountState::default());
        Ok(id)
    }

    async fn create_onboarding_session(
        &self,
        _external_account_id: &str,
        _return_url: &str,
        _refresh_url: &str,
    ) -> Result<IssuedSession, ProcessorError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(self.mint("acctlink"))
    }

    async fn create_checkout_session(
        &self,
        _request: &CheckoutRequest,
    ) -> Result<IssuedSession, ProcessorError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(self.mint("cs"))
    }

    async fn create_billing_portal_session(
        &self,
        _customer_id: &str,
        _return_url: &str,
    ) -> Result<IssuedSession, ProcessorError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(self.mint("bps"))
    }

    async fn fetch_account(
        &self,
        external_account_id: &str,
    ) -> Result<AccountSnapshot, ProcessorError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self
            .accounts
            .lock()
            .unwrap()
            .get(external_account_id)
            .copied()
            .ok_or_else(|| ProcessorError::Api {
                status: 404,
                message: format!("no such account: {external_account_id}"),
            })?;
        Ok(AccountSnapshot {
            external_account_id: external_account_id.to_string(),
            charges_enabled: state.charges_enabled,
            payouts_enabled: state.payouts_enabled,
            details_submitted: state.details_submitted,
            disqualified: state.disqualified,
            captured_at: Timestamp::now(),
        })
    }
}
