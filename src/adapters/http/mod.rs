//! HTTP adapter exposing the reconciliation core via REST.
//!
//! - `POST /api/accounts/{id}/payout-onboarding` - Hosted onboarding link
//! - `GET /api/accounts/{id}/payout-status` - Reconciled payout standing
//! - `POST /api/accounts/{id}/payout-status/refresh` - Pull-path refresh
//! - `POST /api/competitions/{id}/publish` - Publish, gated on payouts
//! - `POST /api/teams` - Register a team, returns the checkout link
//! - `POST /api/teams/{id}/update-payment` - Billing portal link
//! - `POST /api/webhooks/payment-processor` - Signed webhook ingestion

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState, SIGNATURE_HEADER};
pub use routes::api_router;
