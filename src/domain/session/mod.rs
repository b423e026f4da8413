//! Brokering of single-use hosted sessions at the payment processor.

mod broker;
mod session;

pub use broker::SessionBroker;
pub use session::{ExternalSession, SessionKey, SessionPurpose, SessionSubject};
