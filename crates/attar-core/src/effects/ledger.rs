//! Ledger effect trait: the backend's atomic moon-spending procedures.

use crate::domain::Letter;
use crate::errors::Result;
use crate::identifiers::{EnvId, LetterId, PrincipalId};
use async_trait::async_trait;

/// Remote procedures that debit moon balances and update aggregate tallies.
///
/// Every operation here is an atomic check-and-decrement server-side; the
/// client's optimistic local accounting is advisory and the ledger is the
/// source of truth for rejections.
#[async_trait]
pub trait LedgerEffects: Send + Sync {
    /// Debit `amount` moons from the principal's balance.
    ///
    /// Returns `Ok(false)` when the authoritative balance is insufficient
    /// (the client's local precondition passed but another device spent
    /// first). Transport and auth failures come back as errors.
    async fn spend_moons(&self, principal: PrincipalId, amount: u32) -> Result<bool>;

    /// Add `amount` to the aggregate tally of one environment choice.
    async fn add_vote_to_env(&self, env: EnvId, choice_index: u32, amount: u32) -> Result<()>;

    /// Debit the principal and credit a letter's received moons in one
    /// server-side operation.
    async fn vote_on_letter(
        &self,
        principal: PrincipalId,
        letter: LetterId,
        amount: u32,
    ) -> Result<()>;

    /// Create a letter, applying the server-side sending cost.
    async fn send_letter(
        &self,
        principal: PrincipalId,
        subject: &str,
        content: &str,
    ) -> Result<Letter>;
}
