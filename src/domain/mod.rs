//! Domain layer: aggregates, state machines, and the services that keep
//! local payment state consistent with the processor.

pub mod billing;
pub mod competition;
pub mod eligibility;
pub mod foundation;
pub mod payout;
pub mod reconciliation;
pub mod session;
