//! Register a team and mint its entry-fee checkout link.

use std::sync::Arc;

use crate::domain::billing::Team;
use crate::domain::eligibility;
use crate::domain::foundation::{CompetitionId, CoreError, TeamId, UserId};
use crate::domain::session::{SessionBroker, SessionKey, SessionPurpose, SessionSubject};
use crate::ports::{
    AccountRepository, CheckoutRequest, Clock, CompetitionRepository, ProcessorGateway,
    TeamRepository,
};

#[derive(Debug, Clone)]
pub struct RegisterTeamCommand {
    pub competition_id: CompetitionId,
    pub coach_id: UserId,
    pub name: String,
    pub coach_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct RegisteredTeam {
    pub team_id: TeamId,
    pub checkout_url: String,
    /// Processor id of the checkout session (cs_xxx).
    pub session_id: String,
}

pub struct RegisterTeamHandler {
    competitions: Arc<dyn CompetitionRepository>,
    teams: Arc<dyn TeamRepository>,
    accounts: Arc<dyn AccountRepository>,
    gateway: Arc<dyn ProcessorGateway>,
    sessions: Arc<SessionBroker>,
    clock: Arc<dyn Clock>,
}

impl RegisterTeamHandler {
    pub fn new(
        competitions: Arc<dyn CompetitionRepository>,
        teams: Arc<dyn TeamRepository>,
        accounts: Arc<dyn AccountRepository>,
        gateway: Arc<dyn ProcessorGateway>,
        sessions: Arc<SessionBroker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            competitions,
            teams,
            accounts,
            gateway,
            sessions,
            clock,
        }
    }

    /// Validates the registration window, persists the unpaid team, and
    /// returns the hosted checkout link. The team stays ineligible until
    /// the completion webhook settles the fee, and only then does it count
    /// against the competition's capacity; an abandoned checkout consumes
    /// nothing.
    pub async fn handle(&self, command: RegisterTeamCommand) -> Result<RegisteredTeam, CoreError> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("team name must not be empty"));
        }

        let competition = self
            .competitions
            .find_by_id(&command.competition_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!("competition {}", command.competition_id))
            })?;
        let now = self.clock.now();
        eligibility::can_register(&competition, now)?;

        if self.teams.name_taken(&competition.id, name).await? {
            return Err(CoreError::conflict(format!(
                "a team named \"{name}\" is already registered"
            )));
        }

        let owner = self
            .accounts
            .find_by_id(&competition.owner_account_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!("payout account {}", competition.owner_account_id))
            })?;
        let destination = owner.external_account_id.clone().ok_or_else(|| {
            CoreError::validation("organizer has no connected processor account")
        })?;

        let team = Team::new(TeamId::new(), competition.id, command.coach_id, name, now);
        self.teams.save(&team).await?;
        tracing::info!(team_id = %team.id, competition_id = %competition.id, "team registered");

        let fee = competition.fee_breakdown();
        let request = CheckoutRequest {
            team_id: team.id,
            competition_name: competition.name.clone(),
            entry_fee_cents: fee.entry_fee_cents,
            platform_fee_cents: fee.platform_fee_cents,
            destination_account_id: destination,
            customer_email: command.coach_email.clone(),
            success_url: command.success_url.clone(),
            cancel_url: command.cancel_url.clone(),
        };
        let key = SessionKey::new(SessionPurpose::Checkout, SessionSubject::Team(team.id));
        let session = self
            .sessions
            .get_or_create(key, || self.gateway.create_checkout_session(&request))
            .await?;

        Ok(RegisteredTeam {
            team_id: team.id,
            checkout_url: session.url,
            session_id: session.external_ref,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccountRepository, InMemoryCompetitionRepository, InMemorySessionStore,
        InMemoryTeamRepository,
    };
    use crate::adapters::stripe::MockProcessorGateway;
    use crate::domain::competition::Competition;
    use crate::domain::foundation::{AccountId, Timestamp};
    use crate::domain::payout::{PayoutAccount, StatusFact};
    use crate::ports::SystemClock;

    struct Fixture {
        handler: RegisterTeamHandler,
        competitions: Arc<InMemoryCompetitionRepository>,
        competition_id: CompetitionId,
    }

    async fn fixture(max_teams: u32, deadline: Timestamp, published: bool) -> Fixture {
        let competitions = Arc::new(InMemoryCompetitionRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::new());
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let gateway = Arc::new(MockProcessorGateway::new());

        let mut owner =
            PayoutAccount::new(AccountId::new(), "owner@example.com", Timestamp::from_unix(0));
        owner.attach_external_account("acct_owner");
        owner.apply_status_fact(&StatusFact {
            charges_enabled: true,
            payouts_enabled: true,
            details_submitted: true,
            disqualified: false,
            source_timestamp: Timestamp::from_unix(100),
        });
        accounts.save(&owner).await.unwrap();

        let mut competition = Competition::new(
            CompetitionId::new(),
            owner.id,
            "Spring Cup",
            10_000,
            max_teams,
            deadline,
            Timestamp::from_unix(0),
        )
        .unwrap();
        if published {
            competition.publish(Timestamp::from_unix(1_000)).unwrap();
        }
        let competition_id = competition.id;
        competitions.save(&competition).await.unwrap();

        let handler = RegisterTeamHandler::new(
            competitions.clone(),
            teams,
            accounts,
            gateway,
            Arc::new(SessionBroker::new(
                Arc::new(InMemorySessionStore::new()),
                Arc::new(SystemClock),
            )),
            Arc::new(SystemClock),
        );
        Fixture {
            handler,
            competitions,
            competition_id,
        }
    }

    fn command(competition_id: CompetitionId, name: &str) -> RegisterTeamCommand {
        RegisterTeamCommand {
            competition_id,
            coach_id: UserId::new(),
            name: name.into(),
            coach_email: "coach@example.com".into(),
            success_url: "https://app.example.com/teams/paid".into(),
            cancel_url: "https://app.example.com/teams/cancelled".into(),
        }
    }

    #[tokio::test]
    async fn registration_returns_a_checkout_link_and_session_id() {
        let fx = fixture(16, Timestamp::now().plus_days(30), true).await;
        let registered = fx
            .handler
            .handle(command(fx.competition_id, "Thunderbolts"))
            .await
            .unwrap();
        assert!(registered.checkout_url.starts_with("https://mock.processor.test/cs/"));
        assert_eq!(registered.session_id, "cs_0");
    }

    #[tokio::test]
    async fn abandoned_registrations_do_not_consume_capacity() {
        let fx = fixture(1, Timestamp::now().plus_days(30), true).await;

        // Neither registration pays, so the single slot stays free.
        fx.handler
            .handle(command(fx.competition_id, "First"))
            .await
            .unwrap();
        fx.handler
            .handle(command(fx.competition_id, "Second"))
            .await
            .unwrap();

        let competition = fx
            .competitions
            .find_by_id(&fx.competition_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(competition.current_team_count, 0);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let fx = fixture(16, Timestamp::now().plus_days(30), true).await;
        fx.handler
            .handle(command(fx.competition_id, "Thunderbolts"))
            .await
            .unwrap();
        let err = fx
            .handler
            .handle(command(fx.competition_id, "THUNDERBOLTS"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn closed_deadline_refuses_registration() {
        let fx = fixture(16, Timestamp::from_unix(1_000), true).await;
        let err = fx
            .handler
            .handle(command(fx.competition_id, "Late Arrivals"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn unpublished_competition_refuses_registration() {
        let fx = fixture(16, Timestamp::now().plus_days(30), false).await;
        let err = fx
            .handler
            .handle(command(fx.competition_id, "Early Birds"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn full_competition_refuses_registration() {
        let fx = fixture(1, Timestamp::now().plus_days(30), true).await;

        // A settled entry fee takes the only slot.
        let mut competition = fx
            .competitions
            .find_by_id(&fx.competition_id)
            .await
            .unwrap()
            .unwrap();
        competition.claim_team_slot().unwrap();
        fx.competitions.update(&competition).await.unwrap();

        let err = fx
            .handler
            .handle(command(fx.competition_id, "Second"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let fx = fixture(16, Timestamp::now().plus_days(30), true).await;
        let err = fx
            .handler
            .handle(command(fx.competition_id, "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
