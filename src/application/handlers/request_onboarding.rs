//! Start or resume payout onboarding for an organizer account.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, CoreError, Timestamp};
use crate::domain::session::{SessionBroker, SessionKey, SessionPurpose, SessionSubject};
use crate::ports::{AccountRepository, ProcessorGateway};

#[derive(Debug, Clone)]
pub struct RequestOnboardingCommand {
    pub account_id: AccountId,
    pub return_url: String,
    pub refresh_url: String,
}

/// The hosted link handed back to the organizer's browser.
#[derive(Debug, Clone)]
pub struct OnboardingLink {
    pub url: String,
    pub expires_at: Timestamp,
}

pub struct RequestOnboardingHandler {
    accounts: Arc<dyn AccountRepository>,
    gateway: Arc<dyn ProcessorGateway>,
    sessions: Arc<SessionBroker>,
}

impl RequestOnboardingHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        gateway: Arc<dyn ProcessorGateway>,
        sessions: Arc<SessionBroker>,
    ) -> Self {
        Self {
            accounts,
            gateway,
            sessions,
        }
    }

    /// Creates the connected account on first use, marks onboarding as
    /// begun, and returns a live hosted link. Already-enabled accounts
    /// are refused; a blocked account may still get a fresh link, since
    /// the processor sometimes reopens review from there.
    pub async fn handle(&self, command: RequestOnboardingCommand) -> Result<OnboardingLink, CoreError> {
        let mut account = self
            .accounts
            .find_by_id(&command.account_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!("payout account {}", command.account_id))
            })?;

        let external_id = match account.external_account_id.clone() {
            Some(id) => id,
            None => {
                let id = self.gateway.create_account(&account.email).await?;
                account.attach_external_account(id.clone());
                id
            }
        };
        account.begin_onboarding()?;
        self.accounts.update(&account).await?;

        let key = SessionKey::new(
            SessionPurpose::Onboarding,
            SessionSubject::Account(command.account_id),
        );
        let session = self
            .sessions
            .get_or_create(key, || {
                self.gateway.create_onboarding_session(
                    &external_id,
                    &command.return_url,
                    &command.refresh_url,
                )
            })
            .await?;

        Ok(OnboardingLink {
            url: session.url,
            expires_at: session.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAccountRepository, InMemorySessionStore};
    use crate::adapters::stripe::MockProcessorGateway;
    use crate::domain::payout::{PayoutAccount, PayoutStatus, StatusFact};
    use crate::ports::SystemClock;

    struct Fixture {
        handler: RequestOnboardingHandler,
        accounts: Arc<InMemoryAccountRepository>,
        gateway: Arc<MockProcessorGateway>,
        account_id: AccountId,
    }

    async fn fixture(account: PayoutAccount) -> Fixture {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let gateway = Arc::new(MockProcessorGateway::new());
        let account_id = account.id;
        accounts.save(&account).await.unwrap();
        let handler = RequestOnboardingHandler::new(
            accounts.clone(),
            gateway.clone(),
            Arc::new(SessionBroker::new(
                Arc::new(InMemorySessionStore::new()),
                Arc::new(SystemClock),
            )),
        );
        Fixture {
            handler,
            accounts,
            gateway,
            account_id,
        }
    }

    fn command(account_id: AccountId) -> RequestOnboardingCommand {
        RequestOnboardingCommand {
            account_id,
            return_url: "https://app.example.com/payouts/return".into(),
            refresh_url: "https://app.example.com/payouts/refresh".into(),
        }
    }

    #[tokio::test]
    async fn first_request_creates_account_and_begins_onboarding() {
        let fx = fixture(PayoutAccount::new(
            AccountId::new(),
            "owner@example.com",
            Timestamp::from_unix(0),
        ))
        .await;

        let link = fx.handler.handle(command(fx.account_id)).await.unwrap();
        assert!(link.url.starts_with("https://mock.processor.test/acctlink/"));

        let account = fx.accounts.find_by_id(&fx.account_id).await.unwrap().unwrap();
        assert!(account.external_account_id.is_some());
        assert_eq!(account.payout_status, PayoutStatus::Pending);
    }

    #[tokio::test]
    async fn repeated_request_reuses_the_live_link() {
        let fx = fixture(PayoutAccount::new(
            AccountId::new(),
            "owner@example.com",
            Timestamp::from_unix(0),
        ))
        .await;

        let first = fx.handler.handle(command(fx.account_id)).await.unwrap();
        let second = fx.handler.handle(command(fx.account_id)).await.unwrap();
        assert_eq!(first.url, second.url);
        assert_eq!(fx.gateway.sessions_minted(), 1);
    }

    #[tokio::test]
    async fn enabled_account_is_refused() {
        let mut account =
            PayoutAccount::new(AccountId::new(), "owner@example.com", Timestamp::from_unix(0));
        account.attach_external_account("acct_1");
        account.apply_status_fact(&StatusFact {
            charges_enabled: true,
            payouts_enabled: true,
            details_submitted: true,
            disqualified: false,
            source_timestamp: Timestamp::from_unix(100),
        });
        let fx = fixture(account).await;

        let err = fx.handler.handle(command(fx.account_id)).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn blocked_account_still_gets_a_link() {
        let mut account =
            PayoutAccount::new(AccountId::new(), "owner@example.com", Timestamp::from_unix(0));
        account.attach_external_account("acct_1");
        account.apply_status_fact(&StatusFact {
            charges_enabled: false,
            payouts_enabled: false,
            details_submitted: true,
            disqualified: true,
            source_timestamp: Timestamp::from_unix(100),
        });
        let fx = fixture(account).await;

        let link = fx.handler.handle(command(fx.account_id)).await;
        assert!(link.is_ok());
        let account = fx.accounts.find_by_id(&fx.account_id).await.unwrap().unwrap();
        assert_eq!(account.payout_status, PayoutStatus::Blocked);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let fx = fixture(PayoutAccount::new(
            AccountId::new(),
            "owner@example.com",
            Timestamp::from_unix(0),
        ))
        .await;
        let err = fx.handler.handle(command(AccountId::new())).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
