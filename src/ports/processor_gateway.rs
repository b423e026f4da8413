//! Outbound port to the payment processor.
//!
//! Everything the platform asks of the processor goes through this trait:
//! minting hosted sessions, creating connected accounts, and pulling a
//! fresh account snapshot when webhooks are not enough.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{CoreError, TeamId, Timestamp};
use crate::domain::payout::StatusFact;

/// Failure talking to the processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The processor answered with a non-success status.
    #[error("processor API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never completed (DNS, TLS, timeout).
    #[error("processor transport error: {0}")]
    Transport(String),

    /// The processor answered 2xx but the body was not what we expect.
    #[error("unexpected processor response: {0}")]
    InvalidResponse(String),
}

impl ProcessorError {
    /// Transport failures and 5xx answers are worth retrying; 4xx means
    /// the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProcessorError::Transport(_) => true,
            ProcessorError::Api { status, .. } => *status >= 500,
            ProcessorError::InvalidResponse(_) => false,
        }
    }
}

impl From<ProcessorError> for CoreError {
    fn from(err: ProcessorError) -> Self {
        CoreError::upstream(err.to_string())
    }
}

/// A hosted session minted at the processor.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub url: String,
    pub external_ref: String,
    pub expires_at: Option<Timestamp>,
}

/// Point-in-time view of a connected account, from a pull.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub external_account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub disqualified: bool,
    pub captured_at: Timestamp,
}

impl AccountSnapshot {
    pub fn as_status_fact(&self) -> StatusFact {
        StatusFact {
            charges_enabled: self.charges_enabled,
            payouts_enabled: self.payouts_enabled,
            details_submitted: self.details_submitted,
            disqualified: self.disqualified,
            source_timestamp: self.captured_at,
        }
    }
}

/// Inputs for an entry-fee checkout session. The fee is split at the
/// processor: the platform share stays, the rest lands on the organizer's
/// connected account.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub team_id: TeamId,
    pub competition_name: String,
    pub entry_fee_cents: i64,
    pub platform_fee_cents: i64,
    pub destination_account_id: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[async_trait]
pub trait ProcessorGateway: Send + Sync {
    /// Create a connected account for an organizer. Returns the
    /// processor's account id (acct_xxx).
    async fn create_account(&self, email: &str) -> Result<String, ProcessorError>;

    /// Mint an onboarding session for a connected account.
    async fn create_onboarding_session(
        &self,
        external_account_id: &str,
        return_url: &str,
        refresh_url: &str,
    ) -> Result<IssuedSession, ProcessorError>;

    /// Mint a checkout session for a team's entry fee plus subscription.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<IssuedSession, ProcessorError>;

    /// Mint a billing portal session for an existing customer.
    async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<IssuedSession, ProcessorError>;

    /// Pull the current state of a connected account.
    async fn fetch_account(&self, external_account_id: &str)
        -> Result<AccountSnapshot, ProcessorError>;
}
