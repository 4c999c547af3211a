//! Session liveness and optimistic mutation coordination for Attar.
//!
//! Two cooperating components run in the end-user client:
//!
//! - [`SessionGuardian`] owns the authentication session lifecycle:
//!   acquisition, periodic and on-demand refresh, expiry prediction, and
//!   visibility-triggered revalidation.
//! - [`MutationCoordinator`] applies local state changes before remote
//!   confirmation for moon spends (voting, letter sending) and reconciles
//!   based on the remote result, retrying once through the guardian when a
//!   failure looks auth-related.
//!
//! Both share one explicitly owned [`StateHandle`]; no ambient globals.
//! Every remote failure is captured into a result value, never left as an
//! uncaught fault.

pub mod retry;
pub mod session;
pub mod state;
pub mod workflows;

pub use retry::{call_with_auth_retry, RetryOutcome, MAX_AUTH_RETRIES};
pub use session::SessionGuardian;
pub use state::{ClientState, StateHandle};
pub use workflows::{MutationCoordinator, MutationState, SpendIntent, SpendPurpose, SpendReceipt};
