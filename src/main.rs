//! Pitchside API server.
//!
//! Wires the in-memory repositories, the Stripe gateway, and the
//! reconciliation core into an axum application.

use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitchside::adapters::http::{api_router, AppState};
use pitchside::adapters::memory::{
    InMemoryAccountRepository, InMemoryCompetitionRepository, InMemoryProcessedEventStore,
    InMemorySessionStore, InMemoryTeamRepository,
};
use pitchside::adapters::stripe::StripeGateway;
use pitchside::application::handlers::{
    PayoutStatusHandler, PublishCompetitionHandler, RegisterTeamHandler, RequestOnboardingHandler,
    UpdatePaymentHandler,
};
use pitchside::config::AppConfig;
use pitchside::domain::reconciliation::{
    PollPolicy, ReconciliationService, StatusPoller, WebhookVerifier,
};
use pitchside::domain::session::SessionBroker;
use pitchside::ports::{Clock, ProcessorGateway, SystemClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.server.log_level)
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        test_mode = config.payment.is_test_mode(),
        "pitchside starting"
    );

    let state = build_state(&config);
    let app = Router::new()
        .nest("/api", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config)),
        )
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_state(config: &AppConfig) -> AppState {
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let teams = Arc::new(InMemoryTeamRepository::new());
    let competitions = Arc::new(InMemoryCompetitionRepository::new());
    let processed = Arc::new(InMemoryProcessedEventStore::new());
    let gateway: Arc<dyn ProcessorGateway> =
        Arc::new(StripeGateway::new(config.payment.clone()));
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
        WebhookVerifier::new(config.payment.webhook_secret.clone()),
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

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
