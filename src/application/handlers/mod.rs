//! Use-case handlers wiring domain services to ports.

mod publish_competition;
mod refresh_payout_status;
mod register_team;
mod request_onboarding;
mod update_payment;

pub use publish_competition::PublishCompetitionHandler;
pub use refresh_payout_status::{PayoutStatusHandler, PayoutStatusView};
pub use register_team::{RegisterTeamCommand, RegisterTeamHandler, RegisteredTeam};
pub use request_onboarding::{OnboardingLink, RequestOnboardingCommand, RequestOnboardingHandler};
pub use update_payment::{UpdatePaymentCommand, UpdatePaymentHandler};
