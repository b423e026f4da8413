//! Axum handlers connecting routes to application layer handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    PayoutStatusHandler, PublishCompetitionHandler, RegisterTeamCommand, RegisterTeamHandler,
    RequestOnboardingCommand, RequestOnboardingHandler, UpdatePaymentCommand, UpdatePaymentHandler,
};
use crate::domain::foundation::{AccountId, CompetitionId, CoreError, TeamId};
use crate::domain::reconciliation::{cancel_pair, ReconciliationService, WebhookError};

use super::dto::{
    ErrorResponse, OnboardingRequest, OnboardingResponse, PayoutStatusResponse,
    PollOutcomeResponse, PortalResponse, RegisterTeamRequest, RegisterTeamResponse,
    UpdatePaymentRequest, WebhookAck,
};

/// Header carrying the processor's webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Shared application state; cloned per request, dependencies Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub onboarding: Arc<RequestOnboardingHandler>,
    pub payout_status: Arc<PayoutStatusHandler>,
    pub publish: Arc<PublishCompetitionHandler>,
    pub register: Arc<RegisterTeamHandler>,
    pub update_payment: Arc<UpdatePaymentHandler>,
    pub reconciliation: Arc<ReconciliationService>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Payout endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/accounts/{id}/payout-onboarding
pub async fn request_onboarding(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
    Json(request): Json<OnboardingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let link = state
        .onboarding
        .handle(RequestOnboardingCommand {
            account_id,
            return_url: request.return_url,
            refresh_url: request.refresh_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(OnboardingResponse::from(link))))
}

/// GET /api/accounts/{id}/payout-status
pub async fn get_payout_status(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.payout_status.status(&account_id).await?;
    Ok(Json(PayoutStatusResponse::from(view)))
}

/// POST /api/accounts/{id}/payout-status/refresh
///
/// Runs the bounded return-flow poll; its first attempt already pulls the
/// account snapshot from the processor, so no separate refresh call is
/// made here. A poll timeout is reported in the body, not as an error.
pub async fn refresh_payout_status(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    // The handle must stay alive for the duration of the poll.
    let (_cancel, signal) = cancel_pair();
    let (outcome, view) = state.payout_status.poll(&account_id, signal).await?;

    let mut response = PayoutStatusResponse::from(view);
    response.poll = Some(PollOutcomeResponse::from(outcome));
    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Competition and team endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/competitions/{id}/publish
pub async fn publish_competition(
    State(state): State<AppState>,
    Path(competition_id): Path<CompetitionId>,
) -> Result<impl IntoResponse, ApiError> {
    let competition = state.publish.handle(&competition_id).await?;
    Ok(Json(serde_json::json!({
        "competition_id": competition.id,
        "status": competition.status,
        "published_at": competition.published_at,
    })))
}

/// POST /api/teams
pub async fn register_team(
    State(state): State<AppState>,
    Json(request): Json<RegisterTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registered = state
        .register
        .handle(RegisterTeamCommand {
            competition_id: request.competition_id,
            coach_id: request.coach_id,
            name: request.team_name,
            coach_email: request.coach_email,
            success_url: request.success_url,
            cancel_url: request.cancel_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterTeamResponse::from(registered)),
    ))
}

/// POST /api/teams/{id}/update-payment
pub async fn update_payment(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let portal_url = state
        .update_payment
        .handle(UpdatePaymentCommand {
            team_id,
            return_url: request.return_url,
        })
        .await?;

    Ok(Json(PortalResponse { portal_url }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/payment-processor
///
/// Signature failures come back 401 so the processor stops retrying;
/// storage failures come back 5xx so it redelivers.
pub async fn handle_processor_webhook(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::InvalidSignature)?;

    let outcome = state.reconciliation.ingest_webhook(&body, signature).await?;

    Ok(Json(WebhookAck {
        received: true,
        outcome: outcome.as_str(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper converting `CoreError` to HTTP responses.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CoreError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED"),
        };

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// Webhook error wrapper; the status code drives processor redelivery.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let body = ErrorResponse::new("WEBHOOK_REJECTED", self.0.to_string());
        (status, Json(body)).into_response()
    }
}
