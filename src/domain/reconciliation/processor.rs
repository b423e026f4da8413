//! Reconciliation service: the single write path from processor facts to
//! local aggregates.
//!
//! Webhooks (push) and account refreshes (pull) both land here, so dedup,
//! watermark ordering, and optimistic-lock retries live in one place.

use std::sync::Arc;

use super::errors::WebhookError;
use super::event::{
    AccountObject, CheckoutObject, InvoiceObject, ProcessorEvent, ProcessorEventKind,
    SubscriptionObject,
};
use super::verifier::WebhookVerifier;
use crate::domain::billing::{FeeBreakdown, Team};
use crate::domain::foundation::{AccountId, CompetitionId, CoreError, FactOutcome, TeamId};
use crate::domain::session::{SessionBroker, SessionKey, SessionPurpose, SessionSubject};
use crate::ports::{
    AccountRepository, Clock, CompetitionRepository, ProcessedEventRecord, ProcessedEventStore,
    ProcessorGateway, SaveResult, TeamRepository,
};

/// Optimistic-lock retries before a webhook is failed back to the
/// processor for redelivery.
const MAX_LOCK_RETRIES: u32 = 3;

/// What happened to an ingested webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The fact changed an aggregate.
    Applied,
    /// The fact was older than the aggregate's watermark.
    Stale,
    /// Event kind we do not handle.
    Ignored,
    /// Idempotency key already recorded.
    Duplicate,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::Stale => "stale",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Duplicate => "duplicate",
        }
    }
}

pub struct ReconciliationService {
    accounts: Arc<dyn AccountRepository>,
    teams: Arc<dyn TeamRepository>,
    competitions: Arc<dyn CompetitionRepository>,
    processed: Arc<dyn ProcessedEventStore>,
    sessions: Arc<SessionBroker>,
    gateway: Arc<dyn ProcessorGateway>,
    verifier: WebhookVerifier,
    clock: Arc<dyn Clock>,
}

impl ReconciliationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        teams: Arc<dyn TeamRepository>,
        competitions: Arc<dyn CompetitionRepository>,
        processed: Arc<dyn ProcessedEventStore>,
        sessions: Arc<SessionBroker>,
        gateway: Arc<dyn ProcessorGateway>,
        verifier: WebhookVerifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            teams,
            competitions,
            processed,
            sessions,
            gateway,
            verifier,
            clock,
        }
    }

    /// Verifies, dedups, and applies one webhook delivery.
    ///
    /// Retryable failures are not recorded in the idempotency ledger, so
    /// the processor's redelivery gets a clean attempt.
    pub async fn ingest_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        let event = self.verifier.verify_and_parse(payload, signature_header)?;

        if self.processed.find(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "duplicate webhook delivery");
            return Ok(WebhookOutcome::Duplicate);
        }

        let outcome = match self.dispatch(&event).await {
            Ok(outcome) => outcome,
            Err(err) if err.is_retryable() => {
                tracing::warn!(event_id = %event.id, error = %err, "webhook handling failed, processor will retry");
                return Err(err);
            }
            Err(err) => {
                // Terminal failure: record it so redeliveries short out.
                let record = ProcessedEventRecord::failed(
                    &event.id,
                    &event.event_type,
                    err.to_string(),
                    event.data.object.clone(),
                    self.clock.now(),
                );
                self.processed.save(record).await?;
                return Err(err);
            }
        };

        let record = match outcome {
            WebhookOutcome::Applied => ProcessedEventRecord::applied(
                &event.id,
                &event.event_type,
                event.data.object.clone(),
                self.clock.now(),
            ),
            WebhookOutcome::Stale => ProcessedEventRecord::stale(
                &event.id,
                &event.event_type,
                event.data.object.clone(),
                self.clock.now(),
            ),
            _ => ProcessedEventRecord::ignored(
                &event.id,
                &event.event_type,
                "unhandled event kind",
                event.data.object.clone(),
                self.clock.now(),
            ),
        };
        match self.processed.save(record).await? {
            SaveResult::Inserted => {
                tracing::info!(event_id = %event.id, kind = %event.event_type, outcome = outcome.as_str(), "webhook reconciled");
                Ok(outcome)
            }
            SaveResult::AlreadyExists => {
                // A concurrent delivery of the same event won the record
                // race after we both passed the dedup check.
                tracing::debug!(event_id = %event.id, "lost idempotency race");
                Ok(WebhookOutcome::Duplicate)
            }
        }
    }

    async fn dispatch(&self, event: &ProcessorEvent) -> Result<WebhookOutcome, WebhookError> {
        match event.kind() {
            ProcessorEventKind::AccountUpdated => self.handle_account_updated(event).await,
            ProcessorEventKind::CheckoutSessionCompleted => {
                self.handle_checkout_completed(event).await
            }
            ProcessorEventKind::InvoicePaymentSucceeded => self.handle_invoice(event, true).await,
            ProcessorEventKind::InvoicePaymentFailed => self.handle_invoice(event, false).await,
            ProcessorEventKind::SubscriptionDeleted => {
                self.handle_subscription_deleted(event).await
            }
            ProcessorEventKind::Unknown => {
                tracing::debug!(kind = %event.event_type, "ignoring unhandled event kind");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn handle_account_updated(
        &self,
        event: &ProcessorEvent,
    ) -> Result<WebhookOutcome, WebhookError> {
        let object: AccountObject = event
            .payload()
            .map_err(|e| WebhookError::Parse(e.to_string()))?;
        let fact = object.as_status_fact(event.source_timestamp());

        for _ in 0..MAX_LOCK_RETRIES {
            let mut account = self
                .accounts
                .find_by_external_id(&object.id)
                .await?
                .ok_or(WebhookError::SubjectNotFound("payout account"))?;

            if account.apply_status_fact(&fact) == FactOutcome::Stale {
                return Ok(WebhookOutcome::Stale);
            }
            match self.accounts.update(&account).await {
                Ok(()) => return Ok(WebhookOutcome::Applied),
                Err(CoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(WebhookError::Storage(
            "optimistic lock contention on payout account".to_string(),
        ))
    }

    async fn handle_checkout_completed(
        &self,
        event: &ProcessorEvent,
    ) -> Result<WebhookOutcome, WebhookError> {
        let object: CheckoutObject = event
            .payload()
            .map_err(|e| WebhookError::Parse(e.to_string()))?;
        let team_id: TeamId = object
            .metadata
            .team_id
            .as_deref()
            .ok_or(WebhookError::MissingField("metadata.team_id"))?
            .parse()
            .map_err(|_| WebhookError::Parse("metadata.team_id is not a uuid".to_string()))?;
        let subscription = object
            .subscription
            .as_deref()
            .ok_or(WebhookError::MissingField("subscription"))?;

        let outcome = self
            .apply_team_fact(TeamLookup::ById(team_id), |team, deadline_passed, fee| {
                team.apply_checkout_completed(
                    subscription,
                    object.customer.as_deref(),
                    fee,
                    event.source_timestamp(),
                    deadline_passed,
                )
            })
            .await?;

        // Capacity counts paid teams, so the roster slot is claimed here,
        // when the fee settles, not at registration time. The watermark
        // makes redeliveries Stale, so the slot is claimed at most once.
        if outcome == WebhookOutcome::Applied {
            if let Some(team) = self.teams.find_by_id(&team_id).await? {
                self.claim_competition_slot(&team.competition_id).await?;
            }
        }

        // The hosted checkout session is spent either way.
        let key = SessionKey::new(SessionPurpose::Checkout, SessionSubject::Team(team_id));
        if let Err(e) = self.sessions.consume(&key).await {
            tracing::warn!(session_key = %key, error = %e, "failed to consume checkout session");
        }
        Ok(outcome)
    }

    /// Counts one more paid team against the competition's capacity. A
    /// full competition is logged, not failed; the fee has already settled
    /// at the processor.
    async fn claim_competition_slot(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<(), WebhookError> {
        for _ in 0..MAX_LOCK_RETRIES {
            let mut competition = self
                .competitions
                .find_by_id(competition_id)
                .await?
                .ok_or(WebhookError::SubjectNotFound("competition"))?;
            if competition.claim_team_slot().is_err() {
                tracing::warn!(
                    competition_id = %competition_id,
                    "paid team settled against a full competition"
                );
                return Ok(());
            }
            match self.competitions.update(&competition).await {
                Ok(()) => return Ok(()),
                Err(CoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(WebhookError::Storage(
            "optimistic lock contention on competition".to_string(),
        ))
    }

    async fn handle_invoice(
        &self,
        event: &ProcessorEvent,
        paid: bool,
    ) -> Result<WebhookOutcome, WebhookError> {
        let object: InvoiceObject = event
            .payload()
            .map_err(|e| WebhookError::Parse(e.to_string()))?;
        let subscription = object
            .subscription
            .clone()
            .ok_or(WebhookError::MissingField("subscription"))?;

        self.apply_team_fact(
            TeamLookup::BySubscription(&subscription),
            |team, deadline_passed, _fee| {
                if paid {
                    team.apply_invoice_paid(event.source_timestamp(), deadline_passed)
                } else {
                    team.apply_invoice_failed(
                        object.attempt_count,
                        event.source_timestamp(),
                        deadline_passed,
                    )
                }
            },
        )
        .await
    }

    async fn handle_subscription_deleted(
        &self,
        event: &ProcessorEvent,
    ) -> Result<WebhookOutcome, WebhookError> {
        let object: SubscriptionObject = event
            .payload()
            .map_err(|e| WebhookError::Parse(e.to_string()))?;

        self.apply_team_fact(
            TeamLookup::BySubscription(&object.id),
            |team, deadline_passed, _fee| {
                team.apply_subscription_deleted(event.source_timestamp(), deadline_passed)
            },
        )
        .await
    }

    /// Pull path: fetch the connected account's current state and fold it
    /// in through the same watermark logic webhooks use.
    pub async fn refresh_account(&self, account_id: &AccountId) -> Result<FactOutcome, CoreError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("payout account {account_id}")))?;
        let external_id = account
            .external_account_id
            .clone()
            .ok_or_else(|| CoreError::validation("account has no connected processor account"))?;

        let snapshot = self.gateway.fetch_account(&external_id).await?;
        let fact = snapshot.as_status_fact();

        for _ in 0..MAX_LOCK_RETRIES {
            let mut account = self
                .accounts
                .find_by_id(account_id)
                .await?
                .ok_or_else(|| CoreError::not_found(format!("payout account {account_id}")))?;
            let outcome = account.apply_status_fact(&fact);
            if outcome == FactOutcome::Stale {
                return Ok(outcome);
            }
            match self.accounts.update(&account).await {
                Ok(()) => return Ok(outcome),
                Err(CoreError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::conflict(
            "optimistic lock contention on payout account",
        ))
    }

    /// Load-apply-save loop for team billing facts. Conflicting saves
    /// reload and reapply; the watermark makes reapplication safe.
    async fn apply_team_fact<F>(
        &self,
        lookup: TeamLookup<'_>,
        mut apply: F,
    ) -> Result<WebhookOutcome, WebhookError>
    where
        F: FnMut(&mut Team, bool, FeeBreakdown) -> FactOutcome,
    {
        for _ in 0..MAX_LOCK_RETRIES {
            let mut team = match lookup {
                TeamLookup::ById(id) => self.teams.find_by_id(&id).await?,
                TeamLookup::BySubscription(sub) => {
                    self.teams.find_by_subscription_id(sub).await?
                }
            }
            .ok_or(WebhookError::SubjectNotFound("team"))?;

            let competition = self
                .competitions
                .find_by_id(&team.competition_id)
                .await?
                .ok_or(WebhookError::SubjectNotFound("competition"))?;
            let deadline_passed = competition.deadline_passed(self.clock.now());

            if apply(&mut team, deadline_passed, competition.fee_breakdown())
                == FactOutcome::Stale
            {
                return Ok(WebhookOutcome::Stale);
            }
            match self.teams.update(&team).await {
                Ok(()) => return Ok(WebhookOutcome::Applied),
                Err(CoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(WebhookError::Storage(
            "optimistic lock contention on team".to_string(),
        ))
    }
}

/// How a billing fact finds its team.
enum TeamLookup<'a> {
    ById(TeamId),
    BySubscription(&'a str),
}
