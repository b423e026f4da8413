//! Bounded status poll after onboarding return.
//!
//! When an organizer lands back from the hosted onboarding flow, the
//! enabling webhook may still be in flight. The poller bridges that gap:
//! a fixed number of short read attempts, with periodic pulls from the
//! processor, until payouts are enabled or the schedule runs out.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::foundation::{AccountId, CoreError};
use crate::domain::reconciliation::ReconciliationService;
use crate::ports::{AccountRepository, Clock};

/// Poll schedule. The defaults give the webhook twenty seconds to land,
/// pulling from the processor on every third attempt.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    /// A processor pull happens on attempts 0, `refresh_every`,
    /// `2 * refresh_every`, and so on.
    pub refresh_every: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
            refresh_every: 3,
        }
    }
}

/// Terminal result of one poll run. Timing out is an expected outcome,
/// not an error; the account stays wherever reconciliation left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Converged { attempts: u32 },
    TimedOut,
    Cancelled,
}

/// Creates a linked cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Caller-side cancellation trigger.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Poller-side cancellation observer.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation fires. Pends forever if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub struct StatusPoller {
    accounts: Arc<dyn AccountRepository>,
    reconciliation: Arc<ReconciliationService>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    /// Accounts with a poll in flight. One poll per account.
    in_flight: Mutex<HashSet<AccountId>>,
}

impl StatusPoller {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        reconciliation: Arc<ReconciliationService>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            accounts,
            reconciliation,
            clock,
            policy,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Polls until payouts are enabled, the schedule is exhausted, or the
    /// caller cancels.
    ///
    /// # Errors
    ///
    /// `Conflict` when a poll for the same account is already running.
    pub async fn poll_until_enabled(
        &self,
        account_id: &AccountId,
        mut cancel: CancelSignal,
    ) -> Result<PollOutcome, CoreError> {
        let _guard = self.claim(account_id)?;

        for attempt in 0..self.policy.max_attempts {
            if cancel.is_cancelled() {
                tracing::info!(account_id = %account_id, attempt, "status poll cancelled");
                return Ok(PollOutcome::Cancelled);
            }

            if attempt % self.policy.refresh_every == 0 {
                // Pull failures are logged, not fatal; a later webhook or
                // pull can still converge the account.
                if let Err(e) = self.reconciliation.refresh_account(account_id).await {
                    tracing::warn!(account_id = %account_id, attempt, error = %e, "processor pull failed during poll");
                }
            }

            let account = self
                .accounts
                .find_by_id(account_id)
                .await?
                .ok_or_else(|| CoreError::not_found(format!("payout account {account_id}")))?;
            if account.payout_status.is_enabled() {
                tracing::info!(account_id = %account_id, attempts = attempt + 1, "status poll converged");
                return Ok(PollOutcome::Converged {
                    attempts: attempt + 1,
                });
            }

            if attempt + 1 < self.policy.max_attempts {
                tokio::select! {
                    _ = self.clock.sleep(self.policy.interval) => {}
                    _ = cancel.cancelled() => {
                        tracing::info!(account_id = %account_id, attempt, "status poll cancelled");
                        return Ok(PollOutcome::Cancelled);
                    }
                }
            }
        }

        tracing::info!(account_id = %account_id, attempts = self.policy.max_attempts, "status poll timed out");
        Ok(PollOutcome::TimedOut)
    }

    fn claim(&self, account_id: &AccountId) -> Result<PollGuard<'_>, CoreError> {
        let mut in_flight = self.in_flight.lock().expect("poll guard mutex poisoned");
        if !in_flight.insert(*account_id) {
            return Err(CoreError::conflict(format!(
                "a status poll for account {account_id} is already running"
            )));
        }
        Ok(PollGuard {
            in_flight: &self.in_flight,
            account_id: *account_id,
        })
    }
}

struct PollGuard<'a> {
    in_flight: &'a Mutex<HashSet<AccountId>>,
    account_id: AccountId,
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.account_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use secrecy::SecretString;

    use crate::adapters::memory::{
        InMemoryAccountRepository, InMemoryCompetitionRepository, InMemoryProcessedEventStore,
        InMemorySessionStore, InMemoryTeamRepository,
    };
    use crate::adapters::stripe::MockProcessorGateway;
    use crate::domain::foundation::Timestamp;
    use crate::domain::payout::{PayoutAccount, PayoutStatus};
    use crate::domain::reconciliation::WebhookVerifier;
    use crate::domain::session::SessionBroker;

    /// Clock whose sleeps return immediately and count invocations.
    struct InstantClock {
        sleeps: AtomicU32,
    }

    impl InstantClock {
        fn new() -> Self {
            Self {
                sleeps: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Clock for InstantClock {
        fn now(&self) -> Timestamp {
            Timestamp::now()
        }

        async fn sleep(&self, _duration: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
    }

    struct Fixture {
        poller: StatusPoller,
        accounts: Arc<InMemoryAccountRepository>,
        gateway: Arc<MockProcessorGateway>,
        account_id: AccountId,
    }

    async fn fixture(policy: PollPolicy) -> Fixture {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let gateway = Arc::new(MockProcessorGateway::new());
        let clock: Arc<dyn Clock> = Arc::new(InstantClock::new());

        let mut account =
            PayoutAccount::new(AccountId::new(), "owner@example.com", Timestamp::from_unix(0));
        account.attach_external_account("acct_poll_1");
        let account_id = account.id;
        accounts.save(&account).await.unwrap();
        gateway.set_account_state("acct_poll_1", false, false, true, false);

        let reconciliation = Arc::new(ReconciliationService::new(
            accounts.clone(),
            Arc::new(InMemoryTeamRepository::new()),
            Arc::new(InMemoryCompetitionRepository::new()),
            Arc::new(InMemoryProcessedEventStore::new()),
            Arc::new(SessionBroker::new(
                Arc::new(InMemorySessionStore::new()),
                clock.clone(),
            )),
            gateway.clone(),
            WebhookVerifier::new(SecretString::new("whsec_poll".to_string())),
            clock.clone(),
        ));
        let poller = StatusPoller::new(accounts.clone(), reconciliation, clock, policy);
        Fixture {
            poller,
            accounts,
            gateway,
            account_id,
        }
    }

    #[tokio::test]
    async fn converges_when_pull_reports_enabled() {
        let fx = fixture(PollPolicy::default()).await;
        fx.gateway.set_account_state("acct_poll_1", true, true, true, false);

        let (_handle, signal) = cancel_pair();
        let outcome = fx
            .poller
            .poll_until_enabled(&fx.account_id, signal)
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Converged { attempts: 1 });
    }

    #[tokio::test]
    async fn times_out_after_the_full_schedule() {
        let fx = fixture(PollPolicy::default()).await;

        let (_handle, signal) = cancel_pair();
        let outcome = fx
            .poller
            .poll_until_enabled(&fx.account_id, signal)
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut);

        // Pulls happened on attempts 0, 3, 6, and 9.
        assert_eq!(fx.gateway.fetch_count(), 4);
    }

    #[tokio::test]
    async fn converges_when_webhook_lands_mid_schedule() {
        let fx = fixture(PollPolicy::default()).await;

        // Simulate the enabling webhook arriving between attempts.
        let accounts = fx.accounts.clone();
        let account_id = fx.account_id;
        let writer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            let mut account = accounts.find_by_id(&account_id).await.unwrap().unwrap();
            account.apply_status_fact(&crate::domain::payout::StatusFact {
                charges_enabled: true,
                payouts_enabled: true,
                details_submitted: true,
                disqualified: false,
                source_timestamp: Timestamp::now(),
            });
            accounts.update(&account).await.unwrap();
        });

        let (_handle, signal) = cancel_pair();
        let outcome = fx
            .poller
            .poll_until_enabled(&fx.account_id, signal)
            .await
            .unwrap();
        writer.await.unwrap();

        match outcome {
            PollOutcome::Converged { attempts } => assert!(attempts <= 10),
            other => panic!("expected convergence, got {other:?}"),
        }
        let account = fx.accounts.find_by_id(&fx.account_id).await.unwrap().unwrap();
        assert_eq!(account.payout_status, PayoutStatus::Enabled);
    }

    #[tokio::test]
    async fn cancellation_before_first_attempt_wins() {
        let fx = fixture(PollPolicy::default()).await;
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let outcome = fx
            .poller
            .poll_until_enabled(&fx.account_id, signal)
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled);
    }

    #[tokio::test]
    async fn second_poll_for_same_account_is_rejected() {
        let fx = fixture(PollPolicy::default()).await;

        let _guard = fx.poller.claim(&fx.account_id).unwrap();
        let (_handle, signal) = cancel_pair();
        let err = fx
            .poller
            .poll_until_enabled(&fx.account_id, signal)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn guard_is_released_after_the_run() {
        let fx = fixture(PollPolicy::default()).await;
        fx.gateway.set_account_state("acct_poll_1", true, true, true, false);

        let (_h1, s1) = cancel_pair();
        fx.poller.poll_until_enabled(&fx.account_id, s1).await.unwrap();
        let (_h2, s2) = cancel_pair();
        let outcome = fx
            .poller
            .poll_until_enabled(&fx.account_id, s2)
            .await
            .unwrap();
        assert!(matches!(outcome, PollOutcome::Converged { .. }));
    }
}
