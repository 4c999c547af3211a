//! Deterministic test doubles for the Attar client core.
//!
//! [`MockBackend`] implements the whole backend capability set
//! (auth, ledger, records, profile) over in-memory state, with scripted
//! failure queues for exercising rollback and retry paths, and call
//! counters for asserting how many remote calls an operation issued.
//! [`MockClock`] is a manually advanced wall clock.
//!
//! Default (unscripted) behavior models the real service: refreshes mint a
//! fresh session for the backend's principal, spends debit the stored
//! profile atomically, and profile creation seeds the starting balance.

mod clock;
mod mock_backend;

pub use clock::MockClock;
pub use mock_backend::{env_snapshot, MockBackend};
