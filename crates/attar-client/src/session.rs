//! Session guardian.
//!
//! Guarantees that operations requiring authentication are attempted only
//! while the session is believed valid, refreshing proactively (expiry
//! lookahead, periodic timer) and reactively (visibility transitions, auth
//! failures reported by the coordinator).
//!
//! Refresh failures are never fatal: they downgrade the client to signed-out
//! presentation and every remote fault is translated into a boolean or
//! result outcome.

use crate::state::StateHandle;
use attar_core::effects::{AuthEffects, Clock, ProfileEffects};
use attar_core::{AttarError, GuardianConfig, Result, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns the session lifecycle for one client instance.
#[derive(Clone)]
pub struct SessionGuardian {
    state: StateHandle,
    auth: Arc<dyn AuthEffects>,
    profile: Arc<dyn ProfileEffects>,
    clock: Arc<dyn Clock>,
    config: GuardianConfig,
}

impl SessionGuardian {
    /// Create a guardian over the shared client state.
    pub fn new(
        state: StateHandle,
        auth: Arc<dyn AuthEffects>,
        profile: Arc<dyn ProfileEffects>,
        clock: Arc<dyn Clock>,
        config: GuardianConfig,
    ) -> Self {
        Self {
            state,
            auth,
            profile,
            clock,
            config,
        }
    }

    /// Shared state handle, for callers that only hold the guardian.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Cheap liveness check before an authenticated operation.
    ///
    /// No session means false. A session expiring within the lookahead
    /// window delegates to [`refresh`](Self::refresh). Otherwise true with
    /// zero remote calls, so repeated checks inside the window are free.
    pub async fn ensure_valid(&self) -> bool {
        let Some(session) = self.state.session() else {
            return false;
        };
        let now = self.clock.now_ms();
        if session.expires_within(now, self.config.expiry_lookahead_ms) {
            debug!(
                expires_at_ms = session.expires_at_ms,
                now_ms = now,
                "session inside expiry lookahead, refreshing"
            );
            return self.refresh().await;
        }
        true
    }

    /// Request a new session from the auth endpoint.
    ///
    /// On success the stored session and principal are replaced, the refresh
    /// instant is stamped, and a best-effort profile reload is fired in the
    /// background. On failure a lower-cost "read current session" fallback
    /// is tried; a still-valid session from it is adopted. Otherwise the
    /// client downgrades to signed-out and this returns false.
    pub async fn refresh(&self) -> bool {
        match self.auth.refresh_session().await {
            Ok(session) => {
                self.adopt_session(session);
                true
            }
            Err(err) => {
                warn!(error = %err, "session refresh failed, trying current-session fallback");
                match self.auth.current_session().await {
                    Ok(Some(session)) if !session.is_expired(self.clock.now_ms()) => {
                        self.adopt_session(session);
                        true
                    }
                    Ok(_) => {
                        info!("no usable session after failed refresh, signing out locally");
                        self.state.clear_session();
                        false
                    }
                    Err(fallback_err) => {
                        warn!(error = %fallback_err, "current-session fallback failed");
                        self.state.clear_session();
                        false
                    }
                }
            }
        }
    }

    /// Periodic trigger, driven by a fixed-interval timer.
    ///
    /// Refreshes only when a principal is set and the client is visible.
    pub async fn tick(&self) {
        if self.state.principal().is_some() && self.state.is_visible() {
            debug!("periodic session refresh");
            self.refresh().await;
        }
    }

    /// Self-driving loop around [`tick`](Self::tick) for hosts that do not
    /// run their own timer.
    pub async fn run(self) {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.refresh_interval_ms));
        // The first tick of a tokio interval fires immediately; skip it so
        // the loop matches a plain fixed-interval timer.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Foreground-transition trigger.
    ///
    /// A transition to visible refreshes only when more than the quiet
    /// period has elapsed since the last successful refresh, so rapid tab
    /// switching does not cause a refresh storm.
    pub async fn handle_visibility_change(&self, visible: bool) {
        let was_visible = self.state.set_visible(visible);
        if !visible || was_visible || self.state.principal().is_none() {
            return;
        }
        let now = self.clock.now_ms();
        let quiet_enough = match self.state.last_refresh() {
            Some(last) => now.saturating_sub(last) > self.config.min_quiet_period_ms,
            None => true,
        };
        if quiet_enough {
            debug!("foreground transition, refreshing session");
            self.refresh().await;
        } else {
            debug!("foreground transition inside quiet period, skipping refresh");
        }
    }

    /// Password sign-in: adopt the session and fire the profile reload.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.adopt_session(session.clone());
        Ok(session)
    }

    /// Best-effort remote sign-out, then reset the client state to its
    /// initialization state.
    pub async fn sign_out(&self) {
        if let Err(err) = self.auth.sign_out().await {
            warn!(error = %err, "remote sign-out failed, clearing local state anyway");
        }
        self.state.reset();
    }

    /// Reload the principal's profile (creating it with the store's
    /// defaults on first login) and cache it.
    pub async fn reload_profile(&self) -> Result<()> {
        let principal = self
            .state
            .principal()
            .ok_or_else(|| AttarError::session_expired("no principal for profile reload"))?;
        let profile = self.profile.create_if_missing(principal).await?;
        self.state.set_profile(profile);
        Ok(())
    }

    /// Fire-and-forget profile reload so dependent balances stay current
    /// without blocking the caller.
    pub fn spawn_profile_reload(&self) {
        let guardian = self.clone();
        tokio::spawn(async move {
            if let Err(err) = guardian.reload_profile().await {
                debug!(error = %err, "background profile reload failed");
            }
        });
    }

    fn adopt_session(&self, session: Session) {
        debug!(principal = %session.principal, "adopting session");
        self.state.set_session(session);
        self.state.set_last_refresh(self.clock.now_ms());
        self.spawn_profile_reload();
    }
}
