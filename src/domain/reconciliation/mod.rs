//! Reconciliation of processor facts into local payment state.
//!
//! Push (signed webhooks) and pull (account refreshes, the bounded poll)
//! converge on the same watermark-ordered apply path.

mod errors;
mod event;
mod poller;
mod processor;
mod verifier;

pub use errors::WebhookError;
pub use event::{
    AccountObject, CheckoutObject, InvoiceObject, ProcessorEvent, ProcessorEventData,
    ProcessorEventKind, SubscriptionObject,
};
pub use poller::{cancel_pair, CancelHandle, CancelSignal, PollOutcome, PollPolicy, StatusPoller};
pub use processor::{ReconciliationService, WebhookOutcome};
pub use verifier::{sign_payload, SignatureHeader, WebhookVerifier};
