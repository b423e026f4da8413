//! Stripe implementation of the processor gateway.
//!
//! All calls go through Stripe's form-encoded REST API with the secret
//! key as basic auth. Connected accounts use the Express flavor; entry
//! fees ride on subscription checkouts with the platform share taken as
//! an application fee.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::PaymentConfig;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    AccountSnapshot, CheckoutRequest, IssuedSession, ProcessorError, ProcessorGateway,
};

pub struct StripeGateway {
    config: PaymentConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProcessorError> {
        let url = format!("{}{path}", self.config.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;

        Self::read_json(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ProcessorError> {
        let url = format!("{}{path}", self.config.api_base_url);
        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;

        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProcessorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| ProcessorError::InvalidResponse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct StripeAccount {
    id: String,
    #[serde(default)]
    charges_enabled: bool,
    #[serde(default)]
    payouts_enabled: bool,
    #[serde(default)]
    details_submitted: bool,
    #[serde(default)]
    requirements: Option<StripeRequirements>,
}

#[derive(Debug, Deserialize)]
struct StripeRequirements {
    #[serde(default)]
    disabled_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeAccountLink {
    url: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[async_trait]
impl ProcessorGateway for StripeGateway {
    async fn create_account(&self, email: &str) -> Result<String, ProcessorError> {
        let params = [
            ("type", "express".to_string()),
            ("email", email.to_string()),
            ("capabilities[card_payments][requested]", "true".to_string()),
            ("capabilities[transfers][requested]", "true".to_string()),
        ];
        let account: StripeAccount = self.post_form("/v1/accounts", &params).await?;
        tracing::info!(external_account_id = %account.id, "created connected account");
        Ok(account.id)
    }

    async fn create_onboarding_session(
        &self,
        external_account_id: &str,
        return_url: &str,
        refresh_url: &str,
    ) -> Result<IssuedSession, ProcessorError> {
        let params = [
            ("account", external_account_id.to_string()),
            ("return_url", return_url.to_string()),
            ("refresh_url", refresh_url.to_string()),
            ("type", "account_onboarding".to_string()),
        ];
        let link: StripeAccountLink = self.post_form("/v1/account_links", &params).await?;
        Ok(IssuedSession {
            url: link.url,
            // Account links carry no id of their own.
            external_ref: external_account_id.to_string(),
            expires_at: link.expires_at.map(Timestamp::from_unix),
        })
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<IssuedSession, ProcessorError> {
        let params = [
            ("mode", "subscription".to_string()),
            ("customer_email", request.customer_email.clone()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("metadata[team_id]", request.team_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                request.entry_fee_cents.to_string(),
            ),
            (
                "line_items[0][price_data][recurring][interval]",
                "month".to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("{} entry fee", request.competition_name),
            ),
            (
                "subscription_data[application_fee_percent]",
                application_fee_percent(request.entry_fee_cents, request.platform_fee_cents),
            ),
            (
                "subscription_data[transfer_data][destination]",
                request.destination_account_id.clone(),
            ),
        ];
        let session: StripeSession = self.post_form("/v1/checkout/sessions", &params).await?;
        Ok(IssuedSession {
            url: session.url,
            external_ref: session.id,
            expires_at: session.expires_at.map(Timestamp::from_unix),
        })
    }

    async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<IssuedSession, ProcessorError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        let session: StripeSession = self
            .post_form("/v1/billing_portal/sessions", &params)
            .await?;
        Ok(IssuedSession {
            url: session.url,
            external_ref: session.id,
            expires_at: session.expires_at.map(Timestamp::from_unix),
        })
    }

    async fn fetch_account(
        &self,
        external_account_id: &str,
    ) -> Result<AccountSnapshot, ProcessorError> {
        let account: StripeAccount =
            self.get(&format!("/v1/accounts/{external_account_id}")).await?;
        let disqualified = account
            .requirements
            .as_ref()
            .and_then(|r| r.disabled_reason.as_deref())
            .is_some_and(|reason| reason.starts_with("rejected"));
        Ok(AccountSnapshot {
            external_account_id: account.id,
            charges_enabled: account.charges_enabled,
            payouts_enabled: account.payouts_enabled,
            details_submitted: account.details_submitted,
            disqualified,
            captured_at: Timestamp::now(),
        })
    }
}

/// Stripe takes the platform share as a percentage with two decimals.
fn application_fee_percent(entry_fee_cents: i64, platform_fee_cents: i64) -> String {
    if entry_fee_cents <= 0 {
        return "0".to_string();
    }
    let percent = platform_fee_cents as f64 / entry_fee_cents as f64 * 100.0;
    format!("{percent:.2}")
}
