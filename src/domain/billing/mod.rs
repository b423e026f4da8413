//! Entry-fee and subscription billing state for teams.

mod status;
mod team;

pub use status::SubscriptionStatus;
pub use team::{FeeBreakdown, Team, INVOICE_GRACE_THRESHOLD};
