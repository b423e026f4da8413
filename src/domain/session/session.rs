//! Single-use sessions minted at the payment processor.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, TeamId, Timestamp};

/// What a hosted session is for. Each purpose maps to a different hosted
/// page at the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPurpose {
    Onboarding,
    Checkout,
    BillingPortal,
}

impl SessionPurpose {
    /// Fallback lifetime in minutes when the processor mints a session
    /// without its own expiry. Onboarding links are deliberately short;
    /// checkout and portal sessions follow the processor's longer window.
    pub fn fallback_ttl_minutes(&self) -> i64 {
        match self {
            SessionPurpose::Onboarding => 5,
            SessionPurpose::Checkout | SessionPurpose::BillingPortal => 30,
        }
    }
}

impl std::fmt::Display for SessionPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPurpose::Onboarding => "ONBOARDING",
            SessionPurpose::Checkout => "CHECKOUT",
            SessionPurpose::BillingPortal => "BILLING_PORTAL",
        };
        write!(f, "{s}")
    }
}

/// Who the session is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionSubject {
    Account(AccountId),
    Team(TeamId),
}

impl std::fmt::Display for SessionSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionSubject::Account(id) => write!(f, "account:{id}"),
            SessionSubject::Team(id) => write!(f, "team:{id}"),
        }
    }
}

/// Brokering key: at most one live session per (purpose, subject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub purpose: SessionPurpose,
    pub subject: SessionSubject,
}

impl SessionKey {
    pub fn new(purpose: SessionPurpose, subject: SessionSubject) -> Self {
        Self { purpose, subject }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.purpose, self.subject)
    }
}

/// A hosted session handed back to the caller. `url` is where the browser
/// goes; `external_ref` is the processor's own id for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSession {
    pub key: SessionKey,
    pub url: String,
    pub external_ref: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub consumed: bool,
}

impl ExternalSession {
    /// Live means issued, not yet consumed, and not yet expired.
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.consumed && self.expires_at.is_after(&now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_is_live_until_consumed_or_expired() {
        let mut session = ExternalSession {
            key: SessionKey::new(
                SessionPurpose::Onboarding,
                SessionSubject::Account(AccountId::new()),
            ),
            url: "https://connect.example.com/setup/x".into(),
            external_ref: "acctlink_1".into(),
            issued_at: Timestamp::from_unix(1_000),
            expires_at: Timestamp::from_unix(2_000),
            consumed: false,
        };
        assert!(session.is_live(Timestamp::from_unix(1_500)));
        assert!(!session.is_live(Timestamp::from_unix(2_000)));

        session.consumed = true;
        assert!(!session.is_live(Timestamp::from_unix(1_500)));
    }

    #[test]
    fn keys_distinguish_purpose_and_subject() {
        let account = AccountId::new();
        let a = SessionKey::new(SessionPurpose::Onboarding, SessionSubject::Account(account));
        let b = SessionKey::new(
            SessionPurpose::BillingPortal,
            SessionSubject::Account(account),
        );
        assert_ne!(a, b);
        assert_eq!(
            a,
            SessionKey::new(SessionPurpose::Onboarding, SessionSubject::Account(account))
        );
    }
}
