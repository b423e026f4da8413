//! Team aggregate.
//!
//! A team belongs to one competition and one coach. Its entry-fee and
//! subscription facts arrive from the processor through the reconciliation
//! paths; eligibility is derived from those facts on every transition and is
//! never writable on its own. The roster lock is monotonic: once asserted,
//! no billing outcome clears it.

use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;
use crate::domain::foundation::{
    CompetitionId, FactOutcome, StateMachine, TeamId, Timestamp, UserId,
};

/// Consecutive invoice failures tolerated before a subscription is written
/// off. The failure after the grace window (the third in a row) lands the
/// team in `Unpaid`.
pub const INVOICE_GRACE_THRESHOLD: u32 = 2;

/// Money split recorded when the entry fee settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub entry_fee_cents: i64,
    pub platform_fee_cents: i64,
    pub owner_net_cents: i64,
}

/// A coach's team within a competition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub competition_id: CompetitionId,
    pub coach_id: UserId,
    pub name: String,

    // Entry fee
    pub entry_fee_paid: bool,
    pub entry_fee_paid_at: Option<Timestamp>,
    pub entry_fee_breakdown: Option<FeeBreakdown>,

    // Processor references
    pub external_customer_id: Option<String>,
    pub subscription_id: Option<String>,

    // Subscription lifecycle. None until the first successful checkout.
    pub subscription_status: Option<SubscriptionStatus>,
    pub consecutive_invoice_failures: u32,

    /// Derived: `entry_fee_paid && subscription_status == Some(Active)`.
    pub is_eligible: bool,

    // Roster lock is monotonic.
    pub roster_locked: bool,
    pub roster_locked_at: Option<Timestamp>,

    pub registered_at: Timestamp,
    /// Monotonic reconciliation watermark shared by all billing facts.
    pub last_synced_at: Option<Timestamp>,
    /// Optimistic concurrency version, bumped by the repository on save.
    pub version: u64,
}

impl Team {
    /// Creates an unpaid team at registration time.
    pub fn new(
        id: TeamId,
        competition_id: CompetitionId,
        coach_id: UserId,
        name: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            competition_id,
            coach_id,
            name: name.into(),
            entry_fee_paid: false,
            entry_fee_paid_at: None,
            entry_fee_breakdown: None,
            external_customer_id: None,
            subscription_id: None,
            subscription_status: None,
            consecutive_invoice_failures: 0,
            is_eligible: false,
            roster_locked: false,
            roster_locked_at: None,
            registered_at: now,
            last_synced_at: None,
            version: 0,
        }
    }

    /// Asserts the roster lock. Idempotent; there is deliberately no way to
    /// clear it from billing code.
    pub fn lock_roster(&mut self, at: Timestamp) {
        if !self.roster_locked {
            self.roster_locked = true;
            self.roster_locked_at = Some(at);
            tracing::info!(team_id = %self.id, "roster locked");
        }
    }

    /// Applies a completed-checkout fact: entry fee settled and the
    /// recurring subscription created in one processor session.
    ///
    /// Re-delivery of the same completion (same subscription, timestamp at
    /// or below the watermark, or fee already settled) is a no-op.
    pub fn apply_checkout_completed(
        &mut self,
        subscription_id: &str,
        customer_id: Option<&str>,
        fee: FeeBreakdown,
        source_timestamp: Timestamp,
        deadline_passed: bool,
    ) -> FactOutcome {
        if self.is_stale(source_timestamp) {
            return FactOutcome::Stale;
        }
        if self.entry_fee_paid && self.subscription_id.as_deref() == Some(subscription_id) {
            tracing::debug!(team_id = %self.id, "checkout completion already applied");
            self.last_synced_at = Some(source_timestamp);
            return FactOutcome::Stale;
        }

        self.entry_fee_paid = true;
        self.entry_fee_paid_at = Some(source_timestamp);
        self.entry_fee_breakdown = Some(fee);
        self.subscription_id = Some(subscription_id.to_string());
        if let Some(customer) = customer_id {
            self.external_customer_id = Some(customer.to_string());
        }
        self.subscription_status = Some(SubscriptionStatus::Active);
        self.consecutive_invoice_failures = 0;

        tracing::info!(
            team_id = %self.id,
            subscription_id,
            entry_fee_cents = fee.entry_fee_cents,
            owner_net_cents = fee.owner_net_cents,
            "entry fee settled, subscription active"
        );

        self.finish_transition(source_timestamp, deadline_passed);
        FactOutcome::Applied
    }

    /// Applies a successful invoice payment: renewal, or recovery from
    /// PastDue. Resets the failure streak.
    pub fn apply_invoice_paid(
        &mut self,
        source_timestamp: Timestamp,
        deadline_passed: bool,
    ) -> FactOutcome {
        if self.is_stale(source_timestamp) {
            return FactOutcome::Stale;
        }
        self.consecutive_invoice_failures = 0;
        self.try_transition(SubscriptionStatus::Active);
        self.finish_transition(source_timestamp, deadline_passed);
        FactOutcome::Applied
    }

    /// Applies a failed invoice payment.
    ///
    /// `consecutive_failures` is the processor's attempt count for the open
    /// invoice. The first failure parks the subscription in PastDue; once
    /// the count exceeds [`INVOICE_GRACE_THRESHOLD`] the subscription is
    /// written off as Unpaid.
    pub fn apply_invoice_failed(
        &mut self,
        consecutive_failures: u32,
        source_timestamp: Timestamp,
        deadline_passed: bool,
    ) -> FactOutcome {
        if self.is_stale(source_timestamp) {
            return FactOutcome::Stale;
        }
        self.consecutive_invoice_failures = consecutive_failures;
        let target = if consecutive_failures > INVOICE_GRACE_THRESHOLD {
            SubscriptionStatus::Unpaid
        } else {
            SubscriptionStatus::PastDue
        };
        self.try_transition(target);
        self.finish_transition(source_timestamp, deadline_passed);
        FactOutcome::Applied
    }

    /// Applies a subscription deletion reported by the processor.
    pub fn apply_subscription_deleted(
        &mut self,
        source_timestamp: Timestamp,
        deadline_passed: bool,
    ) -> FactOutcome {
        if self.is_stale(source_timestamp) {
            return FactOutcome::Stale;
        }
        self.try_transition(SubscriptionStatus::Canceled);
        self.finish_transition(source_timestamp, deadline_passed);
        FactOutcome::Applied
    }

    fn is_stale(&self, source_timestamp: Timestamp) -> bool {
        match self.last_synced_at {
            Some(watermark) if !source_timestamp.is_after(&watermark) => {
                tracing::debug!(
                    team_id = %self.id,
                    fact_ts = %source_timestamp,
                    watermark = %watermark,
                    "dropping stale billing fact"
                );
                true
            }
            _ => false,
        }
    }

    /// Moves the subscription along a valid edge, or leaves it alone.
    ///
    /// Facts bound for a forbidden edge (an invoice failure for a Canceled
    /// subscription, Unpaid straight from Active) are consumed without a
    /// status change so the watermark still advances.
    fn try_transition(&mut self, target: SubscriptionStatus) {
        match self.subscription_status {
            Some(current) if current == target => {}
            Some(current) if current.can_transition_to(&target) => {
                tracing::info!(
                    team_id = %self.id,
                    from = ?current,
                    to = ?target,
                    "subscription status transition"
                );
                self.subscription_status = Some(target);
            }
            Some(current) => {
                // Unpaid from Active means the grace accounting raced the
                // first failure; step through PastDue to keep the machine
                // honest.
                if current == SubscriptionStatus::Active && target == SubscriptionStatus::Unpaid {
                    self.subscription_status = Some(SubscriptionStatus::PastDue);
                    tracing::warn!(
                        team_id = %self.id,
                        "invoice failures exceeded grace while Active; parking in PAST_DUE"
                    );
                } else {
                    tracing::warn!(
                        team_id = %self.id,
                        current = ?current,
                        implied = ?target,
                        "ignoring fact implying forbidden subscription transition"
                    );
                }
            }
            None => {
                tracing::warn!(
                    team_id = %self.id,
                    implied = ?target,
                    "billing fact for a team with no subscription"
                );
            }
        }
    }

    /// Shared tail of every transition: derive eligibility, assert the
    /// roster lock when the registration window is over, advance the
    /// watermark.
    fn finish_transition(&mut self, source_timestamp: Timestamp, deadline_passed: bool) {
        self.is_eligible = self.entry_fee_paid
            && self
                .subscription_status
                .is_some_and(|s| s.grants_eligibility());
        if deadline_passed {
            self.lock_roster(source_timestamp);
        }
        self.last_synced_at = Some(source_timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team::new(
            TeamId::new(),
            CompetitionId::new(),
            UserId::new(),
            "Thunderbolts",
            Timestamp::from_unix(1_000),
        )
    }

    fn fee() -> FeeBreakdown {
        FeeBreakdown {
            entry_fee_cents: 10_000,
            platform_fee_cents: 800,
            owner_net_cents: 9_200,
        }
    }

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix(secs)
    }

    #[test]
    fn new_team_is_unpaid_and_ineligible() {
        let team = team();
        assert!(!team.entry_fee_paid);
        assert!(team.subscription_status.is_none());
        assert!(!team.is_eligible);
        assert!(!team.roster_locked);
    }

    #[test]
    fn checkout_completion_activates_and_makes_eligible() {
        let mut team = team();
        let outcome =
            team.apply_checkout_completed("sub_1", Some("cus_1"), fee(), ts(2_000), false);
        assert_eq!(outcome, FactOutcome::Applied);
        assert!(team.entry_fee_paid);
        assert_eq!(team.entry_fee_paid_at, Some(ts(2_000)));
        assert_eq!(team.subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(team.external_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Active));
        assert!(team.is_eligible);
    }

    #[test]
    fn checkout_redelivery_is_a_no_op() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", Some("cus_1"), fee(), ts(2_000), false);
        let before = team.clone();

        let outcome =
            team.apply_checkout_completed("sub_1", Some("cus_1"), fee(), ts(2_000), false);
        assert_eq!(outcome, FactOutcome::Stale);
        assert_eq!(team.entry_fee_paid_at, before.entry_fee_paid_at);
        assert_eq!(team.subscription_status, before.subscription_status);
    }

    #[test]
    fn first_invoice_failure_parks_in_past_due_and_revokes_eligibility() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);

        let outcome = team.apply_invoice_failed(1, ts(3_000), false);
        assert_eq!(outcome, FactOutcome::Applied);
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::PastDue));
        // Eligibility is revoked immediately at PAST_DUE.
        assert!(!team.is_eligible);
        // The fee stays settled; only the subscription lapsed.
        assert!(team.entry_fee_paid);
    }

    #[test]
    fn three_consecutive_failures_write_off_as_unpaid() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);

        team.apply_invoice_failed(1, ts(3_000), false);
        team.apply_invoice_failed(2, ts(4_000), false);
        team.apply_invoice_failed(3, ts(5_000), false);

        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Unpaid));
        assert!(!team.is_eligible);
        assert_eq!(team.consecutive_invoice_failures, 3);
    }

    #[test]
    fn past_due_recovers_on_successful_invoice() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);
        team.apply_invoice_failed(1, ts(3_000), false);

        let outcome = team.apply_invoice_paid(ts(4_000), false);
        assert_eq!(outcome, FactOutcome::Applied);
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Active));
        assert!(team.is_eligible);
        assert_eq!(team.consecutive_invoice_failures, 0);
    }

    #[test]
    fn subscription_deletion_cancels() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);

        team.apply_subscription_deleted(ts(3_000), false);
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Canceled));
        assert!(!team.is_eligible);
    }

    #[test]
    fn stale_fact_never_rewinds_status() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);
        team.apply_invoice_paid(ts(5_000), false);

        // An old failure webhook arriving late.
        let outcome = team.apply_invoice_failed(1, ts(3_000), false);
        assert_eq!(outcome, FactOutcome::Stale);
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Active));
        assert!(team.is_eligible);
    }

    #[test]
    fn roster_lock_asserted_when_deadline_passed() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), true);
        assert!(team.roster_locked);
        assert_eq!(team.roster_locked_at, Some(ts(2_000)));
    }

    #[test]
    fn roster_lock_survives_every_billing_outcome() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);
        team.lock_roster(ts(2_500));
        let locked_at = team.roster_locked_at;

        team.apply_invoice_failed(1, ts(3_000), false);
        team.apply_invoice_paid(ts(4_000), false);
        team.apply_invoice_failed(5, ts(5_000), false);
        team.apply_subscription_deleted(ts(6_000), false);

        assert!(team.roster_locked);
        assert_eq!(team.roster_locked_at, locked_at);
    }

    #[test]
    fn billing_alone_never_asserts_the_lock() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);
        team.apply_invoice_failed(1, ts(3_000), false);
        team.apply_invoice_failed(4, ts(4_000), false);
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Unpaid));
        assert!(!team.roster_locked);
    }

    #[test]
    fn terminal_subscription_ignores_further_failures() {
        let mut team = team();
        team.apply_checkout_completed("sub_1", None, fee(), ts(2_000), false);
        team.apply_subscription_deleted(ts(3_000), false);

        let outcome = team.apply_invoice_failed(1, ts(4_000), false);
        assert_eq!(outcome, FactOutcome::Applied);
        assert_eq!(team.subscription_status, Some(SubscriptionStatus::Canceled));
        // Watermark still advanced so older replays stay stale.
        assert_eq!(team.last_synced_at, Some(ts(4_000)));
    }
}
