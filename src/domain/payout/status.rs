//! Payout enablement state machines.
//!
//! Two parallel views of the same external onboarding process: the coarse
//! payout capability (`PayoutStatus`, what the platform gates on) and the
//! processor-side verification progress (`ConnectStatus`, what the owner
//! sees in remediation prompts).

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Whether an owner account can receive funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    /// Owner has never started onboarding.
    None,

    /// Onboarding started or details submitted, awaiting verification.
    Pending,

    /// Processor reports charges and payouts enabled. Publishing is allowed.
    Enabled,

    /// Processor flagged disqualifying requirements. Needs manual external
    /// resolution; a later fact may revive the account once resolved.
    Blocked,
}

impl PayoutStatus {
    /// True if this status permits publishing competitions.
    pub fn is_enabled(&self) -> bool {
        matches!(self, PayoutStatus::Enabled)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PayoutStatus::None => "NONE",
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Enabled => "ENABLED",
            PayoutStatus::Blocked => "BLOCKED",
        };
        write!(f, "{s}")
    }
}

impl StateMachine for PayoutStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (PayoutStatus::None, PayoutStatus::Pending)
                | (PayoutStatus::None, PayoutStatus::Enabled)
                | (PayoutStatus::None, PayoutStatus::Blocked)
                | (PayoutStatus::Pending, PayoutStatus::Enabled)
                | (PayoutStatus::Pending, PayoutStatus::Blocked)
                // Compliance regression reported by the processor.
                | (PayoutStatus::Enabled, PayoutStatus::Blocked)
                // Revival after manual resolution at the processor.
                | (PayoutStatus::Blocked, PayoutStatus::Enabled)
                | (PayoutStatus::Blocked, PayoutStatus::Pending)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PayoutStatus::*;
        match self {
            None => vec![Pending, Enabled, Blocked],
            Pending => vec![Enabled, Blocked],
            Enabled => vec![Blocked],
            Blocked => vec![Enabled, Pending],
        }
    }
}

/// Processor-side verification progress for the connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectStatus {
    /// No connected account created yet.
    NotStarted,

    /// Account exists but verification is incomplete.
    Incomplete,

    /// Fully verified by the processor.
    Verified,

    /// Verification rejected pending manual resolution.
    Blocked,
}

impl StateMachine for ConnectStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (ConnectStatus::NotStarted, ConnectStatus::Incomplete)
                | (ConnectStatus::NotStarted, ConnectStatus::Verified)
                | (ConnectStatus::NotStarted, ConnectStatus::Blocked)
                | (ConnectStatus::Incomplete, ConnectStatus::Verified)
                | (ConnectStatus::Incomplete, ConnectStatus::Blocked)
                | (ConnectStatus::Verified, ConnectStatus::Incomplete)
                | (ConnectStatus::Verified, ConnectStatus::Blocked)
                | (ConnectStatus::Blocked, ConnectStatus::Incomplete)
                | (ConnectStatus::Blocked, ConnectStatus::Verified)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectStatus::*;
        match self {
            NotStarted => vec![Incomplete, Verified, Blocked],
            Incomplete => vec![Verified, Blocked],
            Verified => vec![Incomplete, Blocked],
            Blocked => vec![Incomplete, Verified],
        }
    }
}
