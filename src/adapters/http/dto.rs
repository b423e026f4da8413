//! HTTP DTOs for the payout and registration endpoints.
//!
//! These types define the JSON request/response structure of the API and
//! form the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{OnboardingLink, PayoutStatusView, RegisteredTeam};
use crate::domain::foundation::{CompetitionId, UserId};
use crate::domain::reconciliation::PollOutcome;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start or resume payout onboarding.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    /// URL the processor redirects to once the organizer finishes.
    pub return_url: String,
    /// URL the processor redirects to when the hosted link expires.
    pub refresh_url: String,
}

/// Request to register a team in a competition.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterTeamRequest {
    pub competition_id: CompetitionId,
    pub coach_id: UserId,
    pub team_name: String,
    pub coach_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Request for a billing portal link.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentRequest {
    pub return_url: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Hosted onboarding link response.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingResponse {
    pub url: String,
    /// When the hosted link stops working (ISO 8601).
    pub expires_at: String,
}

impl From<OnboardingLink> for OnboardingResponse {
    fn from(link: OnboardingLink) -> Self {
        Self {
            url: link.url,
            expires_at: link.expires_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Payout status response, optionally annotated with the poll outcome
/// that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutStatusResponse {
    #[serde(flatten)]
    pub view: PayoutStatusView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollOutcomeResponse>,
}

impl From<PayoutStatusView> for PayoutStatusResponse {
    fn from(view: PayoutStatusView) -> Self {
        Self { view, poll: None }
    }
}

/// How a bounded status poll ended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "outcome")]
pub enum PollOutcomeResponse {
    Converged { attempts: u32 },
    TimedOut,
    Cancelled,
}

impl From<PollOutcome> for PollOutcomeResponse {
    fn from(outcome: PollOutcome) -> Self {
        match outcome {
            PollOutcome::Converged { attempts } => Self::Converged { attempts },
            PollOutcome::TimedOut => Self::TimedOut,
            PollOutcome::Cancelled => Self::Cancelled,
        }
    }
}

/// Registration response carrying the checkout link. The session id is
/// what the return-flow polls by after the browser comes back.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterTeamResponse {
    pub team_id: String,
    pub checkout_url: String,
    pub session_id: String,
}

impl From<RegisteredTeam> for RegisterTeamResponse {
    fn from(registered: RegisteredTeam) -> Self {
        Self {
            team_id: registered.team_id.to_string(),
            checkout_url: registered.checkout_url,
            session_id: registered.session_id,
        }
    }
}

/// Billing portal link response.
#[derive(Debug, Clone, Serialize)]
pub struct PortalResponse {
    pub portal_url: String,
}

/// Webhook acknowledgment; `outcome` is one of applied, stale, ignored,
/// duplicate.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: &'static str,
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
