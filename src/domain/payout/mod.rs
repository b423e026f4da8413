//! Payout domain module.
//!
//! Tracks a competition owner's payout-enablement lifecycle against the
//! external payment processor.

mod account;
mod status;

pub use account::{PayoutAccount, StatusFact};
pub use status::{ConnectStatus, PayoutStatus};
