//! Append-only record store effect trait.

use crate::domain::VoteRecord;
use crate::errors::Result;
use async_trait::async_trait;

/// Append-only inserts keyed by principal.
///
/// No transactional coupling to the ledger: a vote record can land while the
/// matching tally increment fails, and the client tolerates that drift.
#[async_trait]
pub trait RecordEffects: Send + Sync {
    /// Append an immutable vote record.
    async fn insert_vote(&self, record: VoteRecord) -> Result<()>;
}
