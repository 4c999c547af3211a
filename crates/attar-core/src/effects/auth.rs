//! Authentication effect trait.

use crate::domain::Session;
use crate::errors::Result;
use async_trait::async_trait;

/// Session lifecycle operations provided by the backend's auth endpoint.
///
/// Sessions always report expiry as an absolute epoch-millisecond instant;
/// the guardian owns all expiry prediction and never asks the provider
/// whether a session "looks" valid.
#[async_trait]
pub trait AuthEffects: Send + Sync {
    /// Read the current session without forcing a token refresh.
    ///
    /// This is the low-cost fallback path; it may return a session that is
    /// near or past expiry and the caller must check.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Request a refreshed session from the auth endpoint.
    async fn refresh_session(&self) -> Result<Session>;

    /// Password sign-in.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Invalidate the current session server-side.
    async fn sign_out(&self) -> Result<()>;
}
