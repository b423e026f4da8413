//! Axum router configuration.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    get_payout_status, handle_processor_webhook, publish_competition, refresh_payout_status,
    register_team, request_onboarding, update_payment, AppState,
};

/// Create the account payout router.
///
/// # Routes
/// - `POST /{id}/payout-onboarding` - Start or resume onboarding
/// - `GET /{id}/payout-status` - Read reconciled payout standing
/// - `POST /{id}/payout-status/refresh` - Pull-path reconciliation
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/payout-onboarding", post(request_onboarding))
        .route("/:id/payout-status", get(get_payout_status))
        .route("/:id/payout-status/refresh", post(refresh_payout_status))
}

/// Create the competition router.
///
/// # Routes
/// - `POST /{id}/publish` - Publish once payouts are enabled
pub fn competition_routes() -> Router<AppState> {
    Router::new().route("/:id/publish", post(publish_competition))
}

/// Create the team router.
///
/// # Routes
/// - `POST /` - Register a team, returns the checkout link
/// - `POST /{id}/update-payment` - Billing portal link
pub fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register_team))
        .route("/:id/update-payment", post(update_payment))
}

/// Create the processor webhook router.
///
/// Separate from the user-facing routes: deliveries carry no user
/// identity and are authenticated by signature alone.
///
/// # Routes
/// - `POST /payment-processor` - Signed webhook ingestion
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/payment-processor", post(handle_processor_webhook))
}

/// Create the complete API router, mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/accounts", account_routes())
        .nest("/competitions", competition_routes())
        .nest("/teams", team_routes())
        .nest("/webhooks", webhook_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use secrecy::SecretString;

    use crate::adapters::memory::{
        InMemoryAccountRepository, InMemoryCompetitionRepository, InMemoryProcessedEventStore,
        InMemorySessionStore, InMemoryTeamRepository,
    };
    use crate::adapters::stripe::MockProcessorGateway;
    use crate::application::handlers::{
        PayoutStatusHandler, PublishCompetitionHandler, RegisterTeamHandler,
        RequestOnboardingHandler, UpdatePaymentHandler,
    };
    use crate::domain::reconciliation::{
        PollPolicy, ReconciliationService, StatusPoller, WebhookVerifier,
    };
    use crate::domain::session::SessionBroker;
    use crate::ports::{Clock, SystemClock};

    fn test_state() -> AppState {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::new());
        let competitions = Arc::new(InMemoryCompetitionRepository::new());
        let processed = Arc::new(InMemoryProcessedEventStore::new());
        let gateway = Arc::new(MockProcessorGateway::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let sessions = Arc::new(SessionBroker::new(
            Arc::new(InMemorySessionStore::new()),
            clock.clone(),
        ));

        let reconciliation = Arc::new(ReconciliationService::new(
            accounts.clone(),
            teams.clone(),
            competitions.clone(),
            processed,
            sessions.clone(),
            gateway.clone(),
            WebhookVerifier::new(SecretString::new("whsec_router".to_string())),
            clock.clone(),
        ));
        let poller = Arc::new(StatusPoller::new(
            accounts.clone(),
            reconciliation.clone(),
            clock.clone(),
            PollPolicy::default(),
        ));

        AppState {
            onboarding: Arc::new(RequestOnboardingHandler::new(
                accounts.clone(),
                gateway.clone(),
                sessions.clone(),
            )),
            payout_status: Arc::new(PayoutStatusHandler::new(
                accounts.clone(),
                reconciliation.clone(),
                poller,
            )),
            publish: Arc::new(PublishCompetitionHandler::new(
                competitions.clone(),
                accounts.clone(),
                clock.clone(),
            )),
            register: Arc::new(RegisterTeamHandler::new(
                competitions,
                teams.clone(),
                accounts,
                gateway.clone(),
                sessions.clone(),
                clock,
            )),
            update_payment: Arc::new(UpdatePaymentHandler::new(teams, gateway, sessions)),
            reconciliation,
        }
    }

    #[test]
    fn api_router_builds() {
        let router = api_router();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn webhook_routes_build() {
        let router = webhook_routes();
        let _: Router<()> = router.with_state(test_state());
    }
}
