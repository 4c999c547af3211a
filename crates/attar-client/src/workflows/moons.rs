//! Optimistic moon spending and decision voting.
//!
//! The coordinator applies the local balance decrement before the remote
//! round-trip so the UI reflects a spend with zero perceived latency, then
//! reconciles: a confirmed spend stands, an auth-classified failure earns
//! one refresh+retry through the guardian, and anything else rolls the
//! decrement back exactly.
//!
//! Mutations against the same balance are not serialized here; two
//! rapid-fire spends can both pass the local precondition and the backend's
//! atomic ledger will reject the second, which then takes the rollback
//! path. That race is accepted; the ledger is the source of truth.

use crate::retry::{call_with_auth_retry, MAX_AUTH_RETRIES};
use crate::session::SessionGuardian;
use crate::state::StateHandle;
use attar_core::effects::{LedgerEffects, RecordEffects};
use attar_core::{
    AttarError, EnvId, LetterId, MoonBalance, Result, Votable, VoteId, VoteRecord,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-attempt lifecycle of an optimistic mutation.
///
/// `Committed` and `Failed` are terminal; the refresh retry is entered at
/// most once per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Nothing in flight
    Idle,
    /// Checking session liveness through the guardian
    ValidatingSession,
    /// Local decrement applied, remote call not yet resolved
    OptimisticApplied,
    /// Remote call in flight
    RemoteCall,
    /// Auth-classified failure, refreshing before the single retry
    RefreshRetry,
    /// Restoring the optimistic decrement
    Rollback,
    /// Decrement confirmed by the ledger
    Committed,
    /// Attempt failed; state restored where a decrement had been applied
    Failed,
}

impl MutationState {
    /// Whether the attempt has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }
}

impl fmt::Display for MutationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::ValidatingSession => "validating-session",
            Self::OptimisticApplied => "optimistic-applied",
            Self::RemoteCall => "remote-call",
            Self::RefreshRetry => "refresh-retry",
            Self::Rollback => "rollback",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// What a spend pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendPurpose {
    /// A vote on one of the current environment's narrative choices
    EnvDecisionVote {
        /// Target environment
        env: EnvId,
        /// Chosen option
        choice_index: u32,
    },
    /// A vote boosting a published letter
    LetterVote {
        /// Target letter
        letter: LetterId,
    },
}

impl fmt::Display for SpendPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvDecisionVote { env, choice_index } => {
                write!(f, "decision vote on {env} choice {choice_index}")
            }
            Self::LetterVote { letter } => write!(f, "letter vote on {letter}"),
        }
    }
}

/// Ephemeral description of a pending balance decrement.
///
/// Created on user action, consumed synchronously by the coordinator,
/// discarded after commit or rollback. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendIntent {
    /// Moons to spend
    pub amount: u32,
    /// Associated side effect
    pub purpose: SpendPurpose,
}

/// Outcome of a committed spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendReceipt {
    /// Moons spent
    pub amount: u32,
    /// Whether the single auth retry was taken
    pub retried: bool,
    /// Local balance after the committed decrement
    pub balance_after: MoonBalance,
}

/// Performs balance-decrementing actions with immediate local feedback and
/// deterministic reconciliation.
#[derive(Clone)]
pub struct MutationCoordinator {
    pub(crate) state: StateHandle,
    pub(crate) guardian: SessionGuardian,
    pub(crate) ledger: Arc<dyn LedgerEffects>,
    pub(crate) records: Arc<dyn RecordEffects>,
}

impl MutationCoordinator {
    /// Create a coordinator sharing the guardian's client state.
    pub fn new(
        guardian: SessionGuardian,
        ledger: Arc<dyn LedgerEffects>,
        records: Arc<dyn RecordEffects>,
    ) -> Self {
        Self {
            state: guardian.state().clone(),
            guardian,
            ledger,
            records,
        }
    }

    /// Shared state handle.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Spend moons with optimistic local feedback.
    ///
    /// Precondition, optimistic decrement, remote ledger call with a single
    /// auth retry, then commit or exact rollback. An insufficient local
    /// balance fails before any remote call or state mutation.
    pub async fn spend(&self, intent: SpendIntent) -> Result<SpendReceipt> {
        let mut phase = MutationState::ValidatingSession;
        debug!(%phase, amount = intent.amount, purpose = %intent.purpose, "starting spend");

        if !self.guardian.ensure_valid().await {
            phase = MutationState::Failed;
            debug!(%phase, "no valid session for spend");
            return Err(AttarError::session_expired("sign in to spend moons"));
        }

        // Precondition check and decrement happen under one lock; an
        // overdraft returns here with zero remote calls issued.
        let balance_after = self.state.debit_moons(intent.amount)?;
        phase = MutationState::OptimisticApplied;
        debug!(%phase, balance_after = %balance_after, "optimistic decrement applied");

        phase = MutationState::RemoteCall;
        debug!(%phase, "issuing ledger call");
        let ledger = self.ledger.clone();
        let state = self.state.clone();
        let amount = intent.amount;
        let outcome = call_with_auth_retry(&self.guardian, MAX_AUTH_RETRIES, move || {
            let ledger = ledger.clone();
            let state = state.clone();
            async move {
                // Re-read the principal so a mid-flight refresh retries with
                // the refreshed identity.
                let principal = state
                    .principal()
                    .ok_or_else(|| AttarError::session_expired("signed out during spend"))?;
                if ledger.spend_moons(principal, amount).await? {
                    Ok(())
                } else {
                    Err(AttarError::remote("moon spend rejected by ledger"))
                }
            }
        })
        .await;

        match outcome {
            Ok(retry_outcome) => {
                phase = MutationState::Committed;
                debug!(%phase, retries = retry_outcome.retries, "spend committed");
                // Non-blocking reconciliation read: corrects for any
                // server-side drift (concurrent spends from another device)
                // without blocking the caller.
                self.guardian.spawn_profile_reload();
                Ok(SpendReceipt {
                    amount: intent.amount,
                    retried: retry_outcome.retries > 0,
                    balance_after,
                })
            }
            Err(err) => {
                phase = MutationState::Rollback;
                let restored = self.state.credit_moons(intent.amount);
                debug!(%phase, restored = %restored, error = %err, "spend rolled back");
                phase = MutationState::Failed;
                debug!(%phase, "spend failed");
                Err(err)
            }
        }
    }

    /// Vote on one of the current environment's narrative choices.
    ///
    /// Spends first; only on success dispatches the two independent remote
    /// effects concurrently: the immutable vote record and the aggregate
    /// tally increment. A tally failure is logged as drift and not surfaced
    /// (the committed vote record wins over strict tally accuracy); a
    /// record failure fails the composite.
    pub async fn vote_on_decision(
        &self,
        env: EnvId,
        choice_index: u32,
        amount: u32,
    ) -> Result<SpendReceipt> {
        let receipt = self
            .spend(SpendIntent {
                amount,
                purpose: SpendPurpose::EnvDecisionVote { env, choice_index },
            })
            .await?;

        let principal = self
            .state
            .principal()
            .ok_or_else(|| AttarError::session_expired("signed out during vote"))?;

        // Optimistic tally bump; the backend counter is authoritative.
        self.state.add_env_votes(env, choice_index, amount);

        let record = VoteRecord {
            id: VoteId::new(),
            principal,
            votable: Votable::EnvDecision(env),
            choice_index: Some(choice_index),
            moon_amount: amount,
        };
        // Neither result gates the other; dispatch both before awaiting.
        let (record_result, tally_result) = futures::join!(
            self.records.insert_vote(record),
            self.ledger.add_vote_to_env(env, choice_index, amount)
        );

        if let Err(err) = tally_result {
            // Accepted eventual-consistency gap: the vote record stands.
            warn!(%env, choice_index, error = %err, "tally increment failed, vote record kept");
        }
        if let Err(err) = record_result {
            warn!(%env, choice_index, error = %err, "vote record insert failed");
            return Err(err);
        }

        Ok(receipt)
    }
}
