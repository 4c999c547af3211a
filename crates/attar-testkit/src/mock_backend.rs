//! In-memory mock of the backend capability set.

use crate::clock::MockClock;
use async_trait::async_trait;
use attar_core::effects::{
    AuthEffects, Clock, LedgerEffects, ProfileEffects, RecordEffects, DEFAULT_STARTING_MOONS,
};
use attar_core::{
    AttarError, EnvChoice, EnvId, EnvSnapshot, Letter, LetterId, MoonBalance, PrincipalId,
    Profile, Result, Session, VoteRecord,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const DEFAULT_SESSION_TTL_MS: u64 = 60 * 60 * 1000;

/// Deterministic backend double implementing all four effect traits.
///
/// Cheap to clone; all clones share the same state. Scripted queues
/// (`fail_next_*`, `push_spend_result`) override the default behavior for
/// the next matching call only.
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
    clock: Arc<MockClock>,
}

#[derive(Default)]
struct MockState {
    principal: PrincipalId,
    session_ttl_ms: u64,
    token_counter: u32,
    current_session: Option<Session>,

    refresh_results: VecDeque<Result<Session>>,
    refresh_calls: u32,
    sign_out_calls: u32,

    spend_results: VecDeque<Result<bool>>,
    spend_calls: usize,
    tally_results: VecDeque<Result<()>>,
    tally_calls: usize,
    letter_vote_results: VecDeque<Result<()>>,
    letter_vote_calls: usize,
    send_letter_results: VecDeque<Result<Letter>>,
    send_letter_calls: usize,

    insert_results: VecDeque<Result<()>>,
    inserted_votes: Vec<VoteRecord>,

    profiles: HashMap<PrincipalId, Profile>,
    letters: HashMap<LetterId, Letter>,
}

impl MockBackend {
    /// Create a backend double with one fixed principal.
    pub fn new(clock: Arc<MockClock>) -> Self {
        let state = MockState {
            principal: PrincipalId::new(),
            session_ttl_ms: DEFAULT_SESSION_TTL_MS,
            ..MockState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
            clock,
        }
    }

    /// The backend's principal.
    pub fn principal(&self) -> PrincipalId {
        self.inner.lock().principal
    }

    /// Lifetime given to minted sessions.
    pub fn session_ttl_ms(&self) -> u64 {
        self.inner.lock().session_ttl_ms
    }

    /// Mint a session for the backend's principal, expiring one TTL from
    /// now. Does not change the stored current session.
    pub fn mint_session(&self) -> Session {
        let mut state = self.inner.lock();
        state.token_counter += 1;
        Session {
            access_token: format!("mock-token-{}", state.token_counter),
            principal: state.principal,
            expires_at_ms: self.clock.now_ms() + state.session_ttl_ms,
        }
    }

    /// Set the session returned by the current-session fallback.
    pub fn set_current_session(&self, session: Session) {
        self.inner.lock().current_session = Some(session);
    }

    /// Clear the stored current session.
    pub fn clear_current_session(&self) {
        self.inner.lock().current_session = None;
    }

    /// Script the next refresh to fail.
    pub fn fail_next_refresh(&self, err: AttarError) {
        self.inner.lock().refresh_results.push_back(Err(err));
    }

    /// Script the next spend to fail.
    pub fn fail_next_spend(&self, err: AttarError) {
        self.inner.lock().spend_results.push_back(Err(err));
    }

    /// Script the next spend's raw result (e.g. `Ok(false)` for an
    /// authoritative overdraft rejection).
    pub fn push_spend_result(&self, result: Result<bool>) {
        self.inner.lock().spend_results.push_back(result);
    }

    /// Script the next tally increment to fail.
    pub fn fail_next_tally(&self, err: AttarError) {
        self.inner.lock().tally_results.push_back(Err(err));
    }

    /// Script the next vote-record insert to fail.
    pub fn fail_next_insert(&self, err: AttarError) {
        self.inner.lock().insert_results.push_back(Err(err));
    }

    /// Script the next letter vote to fail.
    pub fn fail_next_letter_vote(&self, err: AttarError) {
        self.inner.lock().letter_vote_results.push_back(Err(err));
    }

    /// Script the next letter send to fail.
    pub fn fail_next_send_letter(&self, err: AttarError) {
        self.inner.lock().send_letter_results.push_back(Err(err));
    }

    /// Create or update the stored profile with the given balance.
    pub fn set_profile_moons(&self, moons: u32) {
        let now = self.clock.now_ms();
        let mut state = self.inner.lock();
        let principal = state.principal;
        state
            .profiles
            .entry(principal)
            .and_modify(|p| p.available_moons = MoonBalance::new(moons))
            .or_insert_with(|| Profile {
                principal,
                pseudoname: "Anonymous".to_string(),
                avatar_url: None,
                available_moons: MoonBalance::new(moons),
                receive_letters: true,
                updated_at_ms: now,
            });
    }

    /// The stored profile for the backend's principal.
    pub fn stored_profile(&self) -> Option<Profile> {
        let state = self.inner.lock();
        state.profiles.get(&state.principal).cloned()
    }

    /// Refresh calls issued so far.
    pub fn refresh_calls(&self) -> u32 {
        self.inner.lock().refresh_calls
    }

    /// Sign-out calls issued so far.
    pub fn sign_out_calls(&self) -> u32 {
        self.inner.lock().sign_out_calls
    }

    /// Ledger spend calls issued so far.
    pub fn spend_calls(&self) -> usize {
        self.inner.lock().spend_calls
    }

    /// Tally-increment calls issued so far.
    pub fn tally_calls(&self) -> usize {
        self.inner.lock().tally_calls
    }

    /// Letter-vote calls issued so far.
    pub fn letter_vote_calls(&self) -> usize {
        self.inner.lock().letter_vote_calls
    }

    /// Letter-send calls issued so far.
    pub fn send_letter_calls(&self) -> usize {
        self.inner.lock().send_letter_calls
    }

    /// Vote records appended so far.
    pub fn inserted_votes(&self) -> Vec<VoteRecord> {
        self.inner.lock().inserted_votes.clone()
    }

    /// This backend as an auth handle.
    pub fn auth(&self) -> Arc<dyn AuthEffects> {
        Arc::new(self.clone())
    }

    /// This backend as a ledger handle.
    pub fn ledger(&self) -> Arc<dyn LedgerEffects> {
        Arc::new(self.clone())
    }

    /// This backend as a record-store handle.
    pub fn records(&self) -> Arc<dyn RecordEffects> {
        Arc::new(self.clone())
    }

    /// This backend as a profile-store handle.
    pub fn profiles(&self) -> Arc<dyn ProfileEffects> {
        Arc::new(self.clone())
    }

    fn mint_and_store(&self) -> Session {
        let session = self.mint_session();
        self.inner.lock().current_session = Some(session.clone());
        session
    }
}

#[async_trait]
impl AuthEffects for MockBackend {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.inner.lock().current_session.clone())
    }

    async fn refresh_session(&self) -> Result<Session> {
        let scripted = {
            let mut state = self.inner.lock();
            state.refresh_calls += 1;
            state.refresh_results.pop_front()
        };
        match scripted {
            Some(result) => result,
            None => Ok(self.mint_and_store()),
        }
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Session> {
        Ok(self.mint_and_store())
    }

    async fn sign_out(&self) -> Result<()> {
        let mut state = self.inner.lock();
        state.sign_out_calls += 1;
        state.current_session = None;
        Ok(())
    }
}

#[async_trait]
impl LedgerEffects for MockBackend {
    async fn spend_moons(&self, principal: PrincipalId, amount: u32) -> Result<bool> {
        let mut state = self.inner.lock();
        state.spend_calls += 1;
        if let Some(result) = state.spend_results.pop_front() {
            return result;
        }
        // Default: atomic check-and-decrement against the stored profile.
        match state.profiles.get_mut(&principal) {
            Some(profile) => match profile.available_moons.debit(amount) {
                Ok(after) => {
                    profile.available_moons = after;
                    Ok(true)
                }
                Err(_) => Ok(false),
            },
            None => Ok(false),
        }
    }

    async fn add_vote_to_env(&self, _env: EnvId, _choice_index: u32, _amount: u32) -> Result<()> {
        let mut state = self.inner.lock();
        state.tally_calls += 1;
        match state.tally_results.pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }

    async fn vote_on_letter(
        &self,
        principal: PrincipalId,
        letter: LetterId,
        amount: u32,
    ) -> Result<()> {
        let mut state = self.inner.lock();
        state.letter_vote_calls += 1;
        if let Some(result) = state.letter_vote_results.pop_front() {
            return result;
        }
        if let Some(profile) = state.profiles.get_mut(&principal) {
            if let Ok(after) = profile.available_moons.debit(amount) {
                profile.available_moons = after;
            } else {
                return Err(AttarError::remote("letter vote rejected by ledger"));
            }
        }
        if let Some(stored) = state.letters.get_mut(&letter) {
            stored.received_moons = stored.received_moons.saturating_add(amount);
        }
        Ok(())
    }

    async fn send_letter(
        &self,
        principal: PrincipalId,
        subject: &str,
        content: &str,
    ) -> Result<Letter> {
        let mut state = self.inner.lock();
        state.send_letter_calls += 1;
        if let Some(result) = state.send_letter_results.pop_front() {
            return result;
        }
        let letter = Letter {
            id: LetterId::new(),
            principal,
            subject: subject.to_string(),
            content: content.to_string(),
            received_moons: 0,
            published: false,
        };
        state.letters.insert(letter.id, letter.clone());
        Ok(letter)
    }
}

#[async_trait]
impl RecordEffects for MockBackend {
    async fn insert_vote(&self, record: VoteRecord) -> Result<()> {
        let mut state = self.inner.lock();
        if let Some(result) = state.insert_results.pop_front() {
            return result;
        }
        state.inserted_votes.push(record);
        Ok(())
    }
}

#[async_trait]
impl ProfileEffects for MockBackend {
    async fn fetch(&self, principal: PrincipalId) -> Result<Option<Profile>> {
        Ok(self.inner.lock().profiles.get(&principal).cloned())
    }

    async fn create_if_missing(&self, principal: PrincipalId) -> Result<Profile> {
        let now = self.clock.now_ms();
        let mut state = self.inner.lock();
        Ok(state
            .profiles
            .entry(principal)
            .or_insert_with(|| Profile {
                principal,
                pseudoname: "Anonymous".to_string(),
                avatar_url: None,
                available_moons: MoonBalance::new(DEFAULT_STARTING_MOONS),
                receive_letters: true,
                updated_at_ms: now,
            })
            .clone())
    }
}

/// Build an environment snapshot with `choices` zero-vote options.
pub fn env_snapshot(choices: usize) -> EnvSnapshot {
    EnvSnapshot {
        id: EnvId::new(),
        day: 1,
        title: "Attar".to_string(),
        choices: (0..choices)
            .map(|i| EnvChoice {
                title: format!("Choice {i}"),
                description: String::new(),
                votes: 0,
            })
            .collect(),
    }
}
