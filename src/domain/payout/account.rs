//! Payout account aggregate.
//!
//! Owns the payout-enablement lifecycle for a competition owner. All status
//! changes flow through [`PayoutAccount::apply_status_fact`], whether the
//! fact arrived by webhook or by polling the processor, so both paths share
//! one staleness rule and one transition table.

use serde::{Deserialize, Serialize};

use super::{ConnectStatus, PayoutStatus};
use crate::domain::foundation::{AccountId, CoreError, FactOutcome, StateMachine, Timestamp};

/// An authoritative processor statement about a connected account, carrying
/// the timestamp of the processor state it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFact {
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    /// Processor reported disqualifying requirements.
    pub disqualified: bool,
    pub source_timestamp: Timestamp,
}

impl StatusFact {
    /// The payout status this fact implies.
    fn implied_payout_status(&self) -> PayoutStatus {
        if self.disqualified {
            PayoutStatus::Blocked
        } else if self.charges_enabled && self.payouts_enabled {
            PayoutStatus::Enabled
        } else if self.details_submitted {
            PayoutStatus::Pending
        } else {
            PayoutStatus::None
        }
    }

    /// The connect status this fact implies.
    fn implied_connect_status(&self) -> ConnectStatus {
        if self.disqualified {
            ConnectStatus::Blocked
        } else if self.charges_enabled && self.payouts_enabled {
            ConnectStatus::Verified
        } else {
            ConnectStatus::Incomplete
        }
    }
}

/// Competition owner account with payout lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub id: AccountId,
    pub email: String,
    pub payout_status: PayoutStatus,
    pub connect_status: ConnectStatus,
    /// Processor-side connected account id, set on first onboarding request.
    pub external_account_id: Option<String>,
    pub onboarded_at: Option<Timestamp>,
    /// Monotonic reconciliation watermark. Facts at or below it are stale.
    pub last_synced_at: Option<Timestamp>,
    /// Optimistic concurrency version, bumped by the repository on save.
    pub version: u64,
    pub created_at: Timestamp,
}

impl PayoutAccount {
    /// Creates a fresh account that has never touched the processor.
    pub fn new(id: AccountId, email: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            email: email.into(),
            payout_status: PayoutStatus::None,
            connect_status: ConnectStatus::NotStarted,
            external_account_id: None,
            onboarded_at: None,
            last_synced_at: None,
            version: 0,
            created_at: now,
        }
    }

    /// Records that the processor-side connected account was created.
    pub fn attach_external_account(&mut self, external_account_id: impl Into<String>) {
        self.external_account_id = Some(external_account_id.into());
    }

    /// Marks the start of onboarding.
    ///
    /// Moves None -> Pending; already-Pending and Blocked accounts are left
    /// unchanged (a Blocked owner may request a fresh link for remediation).
    /// Fails with `Conflict` for an Enabled account, which has nothing to
    /// onboard.
    pub fn begin_onboarding(&mut self) -> Result<(), CoreError> {
        if self.payout_status == PayoutStatus::Enabled {
            return Err(CoreError::conflict("payout account is already enabled"));
        }
        if self.payout_status == PayoutStatus::None {
            self.payout_status = self.payout_status.transition_to(PayoutStatus::Pending)?;
        }
        if self.connect_status == ConnectStatus::NotStarted {
            self.connect_status = ConnectStatus::Incomplete;
        }
        Ok(())
    }

    /// Applies a processor status fact, shared by the push and pull paths.
    ///
    /// A fact whose source timestamp does not strictly advance
    /// `last_synced_at` is dropped as stale. On acceptance the watermark
    /// advances even when the fact changes nothing, so replays of the
    /// accepted fact are stale on arrival.
    ///
    /// The implied status is applied only along valid transition edges; a
    /// fact implying an edge the state machine forbids (for example
    /// Enabled -> Pending without a disqualification) advances the
    /// watermark but leaves the status alone.
    pub fn apply_status_fact(&mut self, fact: &StatusFact) -> FactOutcome {
        if let Some(watermark) = self.last_synced_at {
            if !fact.source_timestamp.is_after(&watermark) {
                tracing::debug!(
                    account_id = %self.id,
                    fact_ts = %fact.source_timestamp,
                    watermark = %watermark,
                    "dropping stale payout status fact"
                );
                return FactOutcome::Stale;
            }
        }

        let target = fact.implied_payout_status();
        if target != self.payout_status {
            if self.payout_status.can_transition_to(&target) {
                tracing::info!(
                    account_id = %self.id,
                    from = ?self.payout_status,
                    to = ?target,
                    "payout status transition"
                );
                self.payout_status = target;
                if target == PayoutStatus::Enabled && self.onboarded_at.is_none() {
                    self.onboarded_at = Some(fact.source_timestamp);
                }
            } else {
                tracing::warn!(
                    account_id = %self.id,
                    current = ?self.payout_status,
                    implied = ?target,
                    "ignoring fact implying forbidden payout transition"
                );
            }
        }

        let connect_target = fact.implied_connect_status();
        if connect_target != self.connect_status
            && self.connect_status.can_transition_to(&connect_target)
        {
            self.connect_status = connect_target;
        }

        self.last_synced_at = Some(fact.source_timestamp);
        FactOutcome::Applied
    }
}
