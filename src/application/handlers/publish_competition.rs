//! Publish a draft competition, gated on the organizer's payout standing.

use std::sync::Arc;

use crate::domain::competition::Competition;
use crate::domain::eligibility;
use crate::domain::foundation::{CompetitionId, CoreError};
use crate::ports::{AccountRepository, Clock, CompetitionRepository};

pub struct PublishCompetitionHandler {
    competitions: Arc<dyn CompetitionRepository>,
    accounts: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
}

impl PublishCompetitionHandler {
    pub fn new(
        competitions: Arc<dyn CompetitionRepository>,
        accounts: Arc<dyn AccountRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            competitions,
            accounts,
            clock,
        }
    }

    pub async fn handle(&self, competition_id: &CompetitionId) -> Result<Competition, CoreError> {
        let mut competition = self
            .competitions
            .find_by_id(competition_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("competition {competition_id}")))?;
        let owner = self
            .accounts
            .find_by_id(&competition.owner_account_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "payout account {}",
                    competition.owner_account_id
                ))
            })?;

        eligibility::can_publish(&competition, &owner)?;
        competition.publish(self.clock.now())?;
        self.competitions.update(&competition).await?;
        Ok(competition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAccountRepository, InMemoryCompetitionRepository};
    use crate::domain::competition::CompetitionStatus;
    use crate::domain::foundation::{AccountId, Timestamp};
    use crate::domain::payout::{PayoutAccount, StatusFact};
    use crate::ports::SystemClock;

    async fn fixture(enabled: bool) -> (PublishCompetitionHandler, CompetitionId) {
        let competitions = Arc::new(InMemoryCompetitionRepository::new());
        let accounts = Arc::new(InMemoryAccountRepository::new());

        let mut owner =
            PayoutAccount::new(AccountId::new(), "owner@example.com", Timestamp::from_unix(0));
        if enabled {
            owner.apply_status_fact(&StatusFact {
                charges_enabled: true,
                payouts_enabled: true,
                details_submitted: true,
                disqualified: false,
                source_timestamp: Timestamp::from_unix(100),
            });
        }
        accounts.save(&owner).await.unwrap();

        let competition = Competition::new(
            CompetitionId::new(),
            owner.id,
            "Spring Cup",
            10_000,
            16,
            Timestamp::now().plus_days(30),
            Timestamp::from_unix(0),
        )
        .unwrap();
        let id = competition.id;
        competitions.save(&competition).await.unwrap();

        (
            PublishCompetitionHandler::new(competitions, accounts, Arc::new(SystemClock)),
            id,
        )
    }

    #[tokio::test]
    async fn publishes_when_owner_payouts_are_enabled() {
        let (handler, id) = fixture(true).await;
        let competition = handler.handle(&id).await.unwrap();
        assert_eq!(competition.status, CompetitionStatus::Published);
        assert!(competition.published_at.is_some());
    }

    #[tokio::test]
    async fn refuses_while_owner_cannot_be_paid() {
        let (handler, id) = fixture(false).await;
        let err = handler.handle(&id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn second_publish_conflicts() {
        let (handler, id) = fixture(true).await;
        handler.handle(&id).await.unwrap();
        let err = handler.handle(&id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}
