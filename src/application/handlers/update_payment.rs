//! Billing portal access for a team's coach.
//!
//! A PastDue team recovers by updating its card in the processor's
//! portal; the recovery itself arrives later as an invoice webhook.

use std::sync::Arc;

use crate::domain::foundation::{CoreError, TeamId};
use crate::domain::session::{SessionBroker, SessionKey, SessionPurpose, SessionSubject};
use crate::ports::{ProcessorGateway, TeamRepository};

#[derive(Debug, Clone)]
pub struct UpdatePaymentCommand {
    pub team_id: TeamId,
    pub return_url: String,
}

pub struct UpdatePaymentHandler {
    teams: Arc<dyn TeamRepository>,
    gateway: Arc<dyn ProcessorGateway>,
    sessions: Arc<SessionBroker>,
}

impl UpdatePaymentHandler {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        gateway: Arc<dyn ProcessorGateway>,
        sessions: Arc<SessionBroker>,
    ) -> Self {
        Self {
            teams,
            gateway,
            sessions,
        }
    }

    /// Returns a live billing portal link for the team's customer.
    pub async fn handle(&self, command: UpdatePaymentCommand) -> Result<String, CoreError> {
        let team = self
            .teams
            .find_by_id(&command.team_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("team {}", command.team_id)))?;
        let customer_id = team.external_customer_id.clone().ok_or_else(|| {
            CoreError::validation("team has no processor customer; entry fee was never paid")
        })?;

        let key = SessionKey::new(
            SessionPurpose::BillingPortal,
            SessionSubject::Team(command.team_id),
        );
        let session = self
            .sessions
            .get_or_create(key, || {
                self.gateway
                    .create_billing_portal_session(&customer_id, &command.return_url)
            })
            .await?;
        Ok(session.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySessionStore, InMemoryTeamRepository};
    use crate::adapters::stripe::MockProcessorGateway;
    use crate::domain::billing::{FeeBreakdown, Team};
    use crate::domain::foundation::{CompetitionId, Timestamp, UserId};
    use crate::ports::SystemClock;

    async fn fixture(paid: bool) -> (UpdatePaymentHandler, TeamId) {
        let teams = Arc::new(InMemoryTeamRepository::new());
        let mut team = Team::new(
            TeamId::new(),
            CompetitionId::new(),
            UserId::new(),
            "Thunderbolts",
            Timestamp::from_unix(0),
        );
        if paid {
            team.apply_checkout_completed(
                "sub_1",
                Some("cus_1"),
                FeeBreakdown {
                    entry_fee_cents: 10_000,
                    platform_fee_cents: 800,
                    owner_net_cents: 9_200,
                },
                Timestamp::from_unix(1_000),
                false,
            );
        }
        let team_id = team.id;
        teams.save(&team).await.unwrap();

        let handler = UpdatePaymentHandler::new(
            teams,
            Arc::new(MockProcessorGateway::new()),
            Arc::new(SessionBroker::new(
                Arc::new(InMemorySessionStore::new()),
                Arc::new(SystemClock),
            )),
        );
        (handler, team_id)
    }

    #[tokio::test]
    async fn paid_team_gets_a_portal_link() {
        let (handler, team_id) = fixture(true).await;
        let url = handler
            .handle(UpdatePaymentCommand {
                team_id,
                return_url: "https://app.example.com/teams".into(),
            })
            .await
            .unwrap();
        assert!(url.starts_with("https://mock.processor.test/bps/"));
    }

    #[tokio::test]
    async fn unpaid_team_is_refused() {
        let (handler, team_id) = fixture(false).await;
        let err = handler
            .handle(UpdatePaymentCommand {
                team_id,
                return_url: "https://app.example.com/teams".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
