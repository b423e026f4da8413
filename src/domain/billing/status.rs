//! Subscription status state machine.
//!
//! Tracks a team's recurring-dues subscription at the processor. A team has
//! no status at all (`None`) until its first successful checkout.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Recurring subscription status for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Dues are current. The only status that grants eligibility.
    Active,

    /// An invoice failed; the processor is retrying within the grace window.
    PastDue,

    /// Subscription ended at the processor. Terminal; a new registration
    /// checkout is required to rejoin.
    Canceled,

    /// Retries exhausted past the grace threshold. Terminal.
    Unpaid,
}

impl SubscriptionStatus {
    /// True if this status contributes to team eligibility.
    pub fn grants_eligibility(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            // Renewal keeps an active subscription active.
            (SubscriptionStatus::Active, SubscriptionStatus::Active)
                | (SubscriptionStatus::Active, SubscriptionStatus::PastDue)
                | (SubscriptionStatus::Active, SubscriptionStatus::Canceled)
                | (SubscriptionStatus::PastDue, SubscriptionStatus::Active)
                | (SubscriptionStatus::PastDue, SubscriptionStatus::Unpaid)
                | (SubscriptionStatus::PastDue, SubscriptionStatus::Canceled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Active, PastDue, Canceled],
            PastDue => vec![Active, Unpaid, Canceled],
            Canceled => vec![],
            Unpaid => vec![],
        }
    }
}
