//! Processor webhook event types.
//!
//! Only the fields the reconciliation paths act on are captured; the rest
//! of the processor's event schema is ignored.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::payout::StatusFact;

/// Webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessorEvent {
    /// Event id (evt_xxx). Doubles as the idempotency key.
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix seconds at which the event was created at the processor. This
    /// is the source timestamp for watermark ordering.
    pub created: i64,

    pub data: ProcessorEventData,

    #[serde(default)]
    pub livemode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessorEventData {
    /// Polymorphic payload, shaped by `event_type`.
    pub object: serde_json::Value,
}

impl ProcessorEvent {
    pub fn kind(&self) -> ProcessorEventKind {
        ProcessorEventKind::parse(&self.event_type)
    }

    pub fn source_timestamp(&self) -> Timestamp {
        Timestamp::from_unix(self.created)
    }

    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event types the reconciliation service dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorEventKind {
    AccountUpdated,
    CheckoutSessionCompleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    SubscriptionDeleted,
    Unknown,
}

impl ProcessorEventKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "account.updated" => Self::AccountUpdated,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unknown,
        }
    }
}

/// `data.object` of an `account.updated` event.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountObject {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
    #[serde(default)]
    pub requirements: Option<AccountRequirements>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountRequirements {
    #[serde(default)]
    pub disabled_reason: Option<String>,
}

impl AccountObject {
    /// A "rejected.*" disabled reason means the processor has turned the
    /// account away for good; everything else is recoverable paperwork.
    pub fn is_disqualified(&self) -> bool {
        self.requirements
            .as_ref()
            .and_then(|r| r.disabled_reason.as_deref())
            .is_some_and(|reason| reason.starts_with("rejected"))
    }

    pub fn as_status_fact(&self, source_timestamp: Timestamp) -> StatusFact {
        StatusFact {
            charges_enabled: self.charges_enabled,
            payouts_enabled: self.payouts_enabled,
            details_submitted: self.details_submitted,
            disqualified: self.is_disqualified(),
            source_timestamp,
        }
    }
}

/// `data.object` of a `checkout.session.completed` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutObject {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutMetadata {
    #[serde(default)]
    pub team_id: Option<String>,
}

/// `data.object` of `invoice.payment_succeeded` / `invoice.payment_failed`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<String>,
    /// Processor-side count of consecutive collection attempts for this
    /// invoice.
    #[serde(default)]
    pub attempt_count: u32,
}

/// `data.object` of a `customer.subscription.deleted` event.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
}
