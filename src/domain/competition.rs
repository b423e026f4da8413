//! Competition aggregate and its lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::domain::billing::FeeBreakdown;
use crate::domain::foundation::{AccountId, CompetitionId, CoreError, StateMachine, Timestamp};

/// Default platform cut of each entry fee, in percent.
pub const DEFAULT_PLATFORM_FEE_PERCENT: u8 = 8;

/// Lifecycle of a competition.
///
/// Draft competitions are invisible to coaches. Publishing opens
/// registration, Active closes it, and both terminal states freeze the
/// aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionStatus {
    Draft,
    Published,
    Active,
    Completed,
    Cancelled,
}

impl StateMachine for CompetitionStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            CompetitionStatus::Draft => {
                vec![CompetitionStatus::Published, CompetitionStatus::Cancelled]
            }
            CompetitionStatus::Published => {
                vec![CompetitionStatus::Active, CompetitionStatus::Cancelled]
            }
            CompetitionStatus::Active => {
                vec![CompetitionStatus::Completed, CompetitionStatus::Cancelled]
            }
            CompetitionStatus::Completed | CompetitionStatus::Cancelled => vec![],
        }
    }
}

impl std::fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompetitionStatus::Draft => "DRAFT",
            CompetitionStatus::Published => "PUBLISHED",
            CompetitionStatus::Active => "ACTIVE",
            CompetitionStatus::Completed => "COMPLETED",
            CompetitionStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// A competition run by one organizer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub owner_account_id: AccountId,
    pub name: String,
    pub status: CompetitionStatus,
    pub entry_fee_cents: i64,
    pub platform_fee_percent: u8,
    pub max_teams: u32,
    /// Paid teams only. Advanced when an entry fee settles, never at
    /// registration time, so abandoned checkouts hold no capacity.
    pub current_team_count: u32,
    pub registration_deadline: Timestamp,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub version: u64,
}

impl Competition {
    pub fn new(
        id: CompetitionId,
        owner_account_id: AccountId,
        name: impl Into<String>,
        entry_fee_cents: i64,
        max_teams: u32,
        registration_deadline: Timestamp,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        if entry_fee_cents < 0 {
            return Err(CoreError::validation("entry fee must not be negative"));
        }
        if max_teams == 0 {
            return Err(CoreError::validation("max_teams must be at least 1"));
        }
        Ok(Self {
            id,
            owner_account_id,
            name: name.into(),
            status: CompetitionStatus::Draft,
            entry_fee_cents,
            platform_fee_percent: DEFAULT_PLATFORM_FEE_PERCENT,
            max_teams,
            current_team_count: 0,
            registration_deadline,
            published_at: None,
            created_at: now,
            version: 0,
        })
    }

    /// Moves the competition out of Draft. Payout gating happens in the
    /// eligibility checks before this is called.
    pub fn publish(&mut self, now: Timestamp) -> Result<(), CoreError> {
        self.status = self.status.transition_to(CompetitionStatus::Published)?;
        self.published_at = Some(now);
        tracing::info!(competition_id = %self.id, "competition published");
        Ok(())
    }

    pub fn begin(&mut self) -> Result<(), CoreError> {
        self.status = self.status.transition_to(CompetitionStatus::Active)?;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), CoreError> {
        self.status = self.status.transition_to(CompetitionStatus::Completed)?;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), CoreError> {
        self.status = self.status.transition_to(CompetitionStatus::Cancelled)?;
        tracing::info!(competition_id = %self.id, "competition cancelled");
        Ok(())
    }

    pub fn deadline_passed(&self, now: Timestamp) -> bool {
        now.is_after(&self.registration_deadline)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_team_count < self.max_teams
    }

    /// Claims one roster slot for a paid team.
    pub fn claim_team_slot(&mut self) -> Result<(), CoreError> {
        if !self.has_capacity() {
            return Err(CoreError::conflict(format!(
                "competition {} is full ({} teams)",
                self.id, self.max_teams
            )));
        }
        self.current_team_count += 1;
        Ok(())
    }

    /// Splits the entry fee into the platform's cut and the organizer's net.
    /// The platform share rounds down; the organizer keeps the remainder.
    pub fn fee_breakdown(&self) -> FeeBreakdown {
        let platform_fee_cents = self.entry_fee_cents * i64::from(self.platform_fee_percent) / 100;
        FeeBreakdown {
            entry_fee_cents: self.entry_fee_cents,
            platform_fee_cents,
            owner_net_cents: self.entry_fee_cents - platform_fee_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competition() -> Competition {
        Competition::new(
            CompetitionId::new(),
            AccountId::new(),
            "Spring Cup",
            10_000,
            16,
            Timestamp::from_unix(100_000),
            Timestamp::from_unix(1_000),
        )
        .unwrap()
    }

    #[test]
    fn lifecycle_follows_the_happy_path() {
        let mut comp = competition();
        assert_eq!(comp.status, CompetitionStatus::Draft);
        comp.publish(Timestamp::from_unix(2_000)).unwrap();
        assert_eq!(comp.status, CompetitionStatus::Published);
        assert_eq!(comp.published_at, Some(Timestamp::from_unix(2_000)));
        comp.begin().unwrap();
        comp.complete().unwrap();
        assert!(comp.status.is_terminal());
    }

    #[test]
    fn completed_competition_cannot_be_cancelled() {
        let mut comp = competition();
        comp.publish(Timestamp::from_unix(2_000)).unwrap();
        comp.begin().unwrap();
        comp.complete().unwrap();
        assert!(comp.cancel().is_err());
    }

    #[test]
    fn draft_cannot_jump_straight_to_active() {
        let mut comp = competition();
        assert!(comp.begin().is_err());
    }

    #[test]
    fn negative_entry_fee_is_rejected() {
        let result = Competition::new(
            CompetitionId::new(),
            AccountId::new(),
            "Bad Cup",
            -1,
            16,
            Timestamp::from_unix(100_000),
            Timestamp::from_unix(1_000),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut comp = Competition::new(
            CompetitionId::new(),
            AccountId::new(),
            "Tiny Cup",
            5_000,
            2,
            Timestamp::from_unix(100_000),
            Timestamp::from_unix(1_000),
        )
        .unwrap();
        comp.claim_team_slot().unwrap();
        comp.claim_team_slot().unwrap();
        assert!(matches!(comp.claim_team_slot(), Err(CoreError::Conflict(_))));
        assert_eq!(comp.current_team_count, 2);
    }

    #[test]
    fn fee_breakdown_rounds_platform_share_down() {
        let mut comp = competition();
        comp.entry_fee_cents = 9_999;
        let fee = comp.fee_breakdown();
        assert_eq!(fee.platform_fee_cents, 799);
        assert_eq!(fee.owner_net_cents, 9_200);
        assert_eq!(fee.platform_fee_cents + fee.owner_net_cents, 9_999);
    }

    #[test]
    fn deadline_comparison_is_strict() {
        let comp = competition();
        assert!(!comp.deadline_passed(Timestamp::from_unix(100_000)));
        assert!(comp.deadline_passed(Timestamp::from_unix(100_001)));
    }
}
