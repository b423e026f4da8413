//! Pure eligibility predicates.
//!
//! Every gate in the system funnels through these functions so the rules
//! live in one place. They take fully loaded aggregates and a clock value;
//! they never touch storage.

use serde::Serialize;

use crate::domain::billing::Team;
use crate::domain::competition::{Competition, CompetitionStatus};
use crate::domain::foundation::{CoreError, Timestamp};
use crate::domain::payout::{PayoutAccount, PayoutStatus};

/// What an organizer must do before their account can receive payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutRemediation {
    StartOnboarding,
    ResumeOnboarding,
    ContactSupport,
}

/// Remediation for an account that cannot yet receive payouts, or `None`
/// when payouts are enabled.
pub fn needs_payout_onboarding(account: &PayoutAccount) -> Option<PayoutRemediation> {
    match account.payout_status {
        PayoutStatus::Enabled => None,
        PayoutStatus::None => Some(PayoutRemediation::StartOnboarding),
        PayoutStatus::Pending => Some(PayoutRemediation::ResumeOnboarding),
        PayoutStatus::Blocked => Some(PayoutRemediation::ContactSupport),
    }
}

/// A competition may only be published while its organizer can actually be
/// paid. Collecting entry fees into an account that cannot receive them
/// strands the money at the processor.
pub fn can_publish(competition: &Competition, owner: &PayoutAccount) -> Result<(), CoreError> {
    if competition.status != CompetitionStatus::Draft {
        return Err(CoreError::conflict(format!(
            "competition {} is {}, only drafts can be published",
            competition.id, competition.status
        )));
    }
    if !owner.payout_status.is_enabled() {
        return Err(CoreError::conflict(format!(
            "organizer payouts are {}, complete payout onboarding before publishing",
            owner.payout_status
        )));
    }
    Ok(())
}

/// Registration requires a published competition, an open deadline, and a
/// free roster slot. Name uniqueness is checked against storage separately.
pub fn can_register(competition: &Competition, now: Timestamp) -> Result<(), CoreError> {
    if competition.status != CompetitionStatus::Published {
        return Err(CoreError::validation(format!(
            "competition {} is not open for registration",
            competition.id
        )));
    }
    if competition.deadline_passed(now) {
        return Err(CoreError::validation("registration deadline has passed"));
    }
    if !competition.has_capacity() {
        return Err(CoreError::validation("competition is full"));
    }
    Ok(())
}

/// Entry fee paid and subscription in good standing.
pub fn is_eligible(team: &Team) -> bool {
    team.entry_fee_paid
        && team
            .subscription_status
            .is_some_and(|s| s.grants_eligibility())
}

/// Roster edits require an eligible team and an unlocked roster. The lock
/// asserts at the registration deadline and never thaws; eligibility lapses
/// and recovers with the subscription.
pub fn is_roster_editable(team: &Team) -> bool {
    !team.roster_locked && is_eligible(team)
}
