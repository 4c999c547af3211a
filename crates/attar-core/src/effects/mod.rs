//! Effect trait definitions for the backend capability set.
//!
//! The client calls the backend service through this narrow
//! `{auth, ledger, records, profile, clock}` surface. Production handlers
//! wrap the hosted service's SDK; `attar-testkit` provides deterministic
//! mocks. The traits are object-safe so handlers can be shared as
//! `Arc<dyn Trait>` across the guardian and coordinator.

mod auth;
mod ledger;
mod profile;
mod records;
mod time;

pub use auth::AuthEffects;
pub use ledger::LedgerEffects;
pub use profile::{ProfileEffects, DEFAULT_STARTING_MOONS};
pub use records::RecordEffects;
pub use time::{Clock, SystemClock};
