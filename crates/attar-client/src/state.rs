//! Explicitly owned client state.
//!
//! The original client held session, profile, and cached app data in ambient
//! reactive globals. Here the same state is one [`ClientState`] value behind
//! a [`StateHandle`], passed by reference to the guardian and coordinator
//! constructors, with a defined initialization (anonymous, no session) and
//! teardown (sign-out resets to initialization) lifecycle.
//!
//! Locking discipline: readers take short read locks; the optimistic spend
//! path does its precondition check and debit under one write lock so the
//! "decrement before remote call, restore on failure" sequencing has a
//! single home.

use attar_core::{
    AttarError, EnvId, EnvSnapshot, Letter, LetterId, MoonBalance, PrincipalId, Profile, Result,
    Session,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Mutable client state shared by the guardian and coordinator.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// Current authentication session, if signed in
    pub session: Option<Session>,
    /// Cached profile for the signed-in principal
    pub profile: Option<Profile>,
    /// Cached snapshot of the current environment
    pub current_env: Option<EnvSnapshot>,
    /// Cached mailbox letters
    pub letters: Vec<Letter>,
    /// Instant of the last successful session refresh, epoch ms
    pub last_refresh_ms: Option<u64>,
    /// Whether the client is currently foreground/visible
    pub visible: bool,
}

impl ClientState {
    /// Initialization state: anonymous, no session, foreground.
    pub fn new() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }
}

/// Shared handle to the client state.
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<RwLock<ClientState>>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandle {
    /// Create a handle holding the initialization state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ClientState::new())),
        }
    }

    /// Clone of the full state, for UI snapshots and tests.
    pub fn snapshot(&self) -> ClientState {
        self.inner.read().clone()
    }

    /// The signed-in principal, if any.
    pub fn principal(&self) -> Option<PrincipalId> {
        self.inner.read().session.as_ref().map(|s| s.principal)
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.read().session.clone()
    }

    /// Whether a session is present (it may still be near expiry).
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().session.is_some()
    }

    /// Moons currently available, zero when signed out.
    pub fn available_moons(&self) -> MoonBalance {
        self.inner
            .read()
            .profile
            .as_ref()
            .map(|p| p.available_moons)
            .unwrap_or_default()
    }

    /// Adopt a session.
    pub fn set_session(&self, session: Session) {
        self.inner.write().session = Some(session);
    }

    /// Drop the session, downgrading to signed-out presentation. Cached app
    /// data stays; an explicit [`reset`](Self::reset) clears everything.
    pub fn clear_session(&self) {
        self.inner.write().session = None;
    }

    /// Replace the cached profile.
    pub fn set_profile(&self, profile: Profile) {
        self.inner.write().profile = Some(profile);
    }

    /// Replace the cached environment snapshot.
    pub fn set_current_env(&self, env: EnvSnapshot) {
        self.inner.write().current_env = Some(env);
    }

    /// Replace the cached mailbox.
    pub fn set_letters(&self, letters: Vec<Letter>) {
        self.inner.write().letters = letters;
    }

    /// Append a letter to the cached mailbox.
    pub fn push_letter(&self, letter: Letter) {
        self.inner.write().letters.push(letter);
    }

    /// Stamp the last successful refresh instant.
    pub fn set_last_refresh(&self, now_ms: u64) {
        self.inner.write().last_refresh_ms = Some(now_ms);
    }

    /// Instant of the last successful refresh.
    pub fn last_refresh(&self) -> Option<u64> {
        self.inner.read().last_refresh_ms
    }

    /// Record visibility, returning the previous value.
    pub fn set_visible(&self, visible: bool) -> bool {
        let mut state = self.inner.write();
        std::mem::replace(&mut state.visible, visible)
    }

    /// Whether the client is foreground/visible.
    pub fn is_visible(&self) -> bool {
        self.inner.read().visible
    }

    /// Optimistic debit: precondition check and decrement under one lock.
    ///
    /// Fails with `InsufficientBalance` (signed out counts as zero balance)
    /// without touching any state; on success returns the new balance.
    pub fn debit_moons(&self, amount: u32) -> Result<MoonBalance> {
        let mut state = self.inner.write();
        let profile = state
            .profile
            .as_mut()
            .ok_or_else(|| AttarError::insufficient_balance(amount, 0))?;
        let after = profile.available_moons.debit(amount)?;
        profile.available_moons = after;
        Ok(after)
    }

    /// Restore a rolled-back debit.
    pub fn credit_moons(&self, amount: u32) -> MoonBalance {
        let mut state = self.inner.write();
        match state.profile.as_mut() {
            Some(profile) => {
                profile.available_moons = profile.available_moons.credit(amount);
                profile.available_moons
            }
            None => MoonBalance::default(),
        }
    }

    /// Bump the cached tally for an environment choice, when the cached
    /// snapshot matches `env`.
    pub fn add_env_votes(&self, env: EnvId, choice_index: u32, amount: u32) {
        let mut state = self.inner.write();
        if let Some(current) = state.current_env.as_mut() {
            if current.id == env {
                current.add_votes(choice_index, amount);
            }
        }
    }

    /// Bump a cached letter's received moons.
    pub fn add_letter_moons(&self, letter: LetterId, amount: u32) {
        let mut state = self.inner.write();
        if let Some(cached) = state.letters.iter_mut().find(|l| l.id == letter) {
            cached.received_moons = cached.received_moons.saturating_add(amount);
        }
    }

    /// Remove `amount` from a cached letter's received moons (rollback).
    pub fn remove_letter_moons(&self, letter: LetterId, amount: u32) {
        let mut state = self.inner.write();
        if let Some(cached) = state.letters.iter_mut().find(|l| l.id == letter) {
            cached.received_moons = cached.received_moons.saturating_sub(amount);
        }
    }

    /// Teardown: reset to the initialization state, preserving visibility.
    pub fn reset(&self) {
        let mut state = self.inner.write();
        let visible = state.visible;
        *state = ClientState::new();
        state.visible = visible;
    }
}
