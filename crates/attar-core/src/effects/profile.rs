//! Profile store effect trait.

use crate::domain::Profile;
use crate::errors::Result;
use crate::identifiers::PrincipalId;
use async_trait::async_trait;

/// Starting balance for a freshly created profile.
///
/// Owned by the profile-store contract, not by the client core; the client
/// only needs it to describe the collaborator's defaults.
pub const DEFAULT_STARTING_MOONS: u32 = 13;

/// Profile reads and first-login creation.
#[async_trait]
pub trait ProfileEffects: Send + Sync {
    /// Fetch the principal's profile, if one exists.
    async fn fetch(&self, principal: PrincipalId) -> Result<Option<Profile>>;

    /// Fetch the profile, creating it with the store's defaults (including
    /// the starting moon balance) when the principal has none yet.
    async fn create_if_missing(&self, principal: PrincipalId) -> Result<Profile>;
}
