//! Domain records mirrored from backend rows.
//!
//! These are client-side cache shapes for the profile, mailbox, environment,
//! and vote tables. The backend's copies are authoritative; everything here
//! is repopulated from reads and optimistically adjusted between them.

use crate::balance::MoonBalance;
use crate::identifiers::{EnvId, LetterId, PrincipalId, VoteId};
use serde::{Deserialize, Serialize};

/// Authentication session: opaque credential plus its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential issued by the auth collaborator
    pub access_token: String,
    /// The authenticated identity this session belongs to
    pub principal: PrincipalId,
    /// Absolute expiry instant, epoch milliseconds
    pub expires_at_ms: u64,
}

impl Session {
    /// Whether the session has expired as of `now_ms`
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms <= now_ms
    }

    /// Whether the session expires within `window_ms` of `now_ms`
    pub fn expires_within(&self, now_ms: u64, window_ms: u64) -> bool {
        self.expires_at_ms <= now_ms.saturating_add(window_ms)
    }
}

/// A principal's profile row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning principal
    pub principal: PrincipalId,
    /// Public display name
    pub pseudoname: String,
    /// Avatar image URL, if one was uploaded
    pub avatar_url: Option<String>,
    /// Spendable moons
    pub available_moons: MoonBalance,
    /// Whether the principal accepts letters from others
    pub receive_letters: bool,
    /// Last modification instant, epoch milliseconds
    pub updated_at_ms: u64,
}

/// A mailbox letter row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    /// Letter identifier
    pub id: LetterId,
    /// Author principal
    pub principal: PrincipalId,
    /// Subject line
    pub subject: String,
    /// Letter body
    pub content: String,
    /// Moons received from other principals' votes
    pub received_moons: u32,
    /// Whether the letter is publicly visible
    pub published: bool,
}

/// One narrative choice inside an environment, with its cached tally.
///
/// `votes` is a client-side cache of the aggregate tally; the backend's
/// counter is the source of truth and may drift ahead of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvChoice {
    /// Choice title
    pub title: String,
    /// Choice description
    pub description: String,
    /// Cached aggregate moon tally for this choice
    pub votes: u32,
}

/// Cached snapshot of the current environment (narrative day)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    /// Environment identifier
    pub id: EnvId,
    /// Narrative day number
    pub day: u32,
    /// Environment title
    pub title: String,
    /// The open narrative choices with their cached tallies
    pub choices: Vec<EnvChoice>,
}

impl EnvSnapshot {
    /// Bump the cached tally for a choice. Out-of-range indices are ignored;
    /// the authoritative tally lives server-side either way.
    pub fn add_votes(&mut self, choice_index: u32, amount: u32) {
        if let Some(choice) = self.choices.get_mut(choice_index as usize) {
            choice.votes = choice.votes.saturating_add(amount);
        }
    }
}

/// What a vote record points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "votable_type", content = "votable_id")]
pub enum Votable {
    /// A narrative choice on an environment
    EnvDecision(EnvId),
    /// A published letter
    Letter(LetterId),
}

/// Immutable, append-only vote record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// Vote identifier
    pub id: VoteId,
    /// Voting principal
    pub principal: PrincipalId,
    /// Vote target
    pub votable: Votable,
    /// Chosen option index, for environment decisions
    pub choice_index: Option<u32>,
    /// Moons attached to the vote
    pub moon_amount: u32,
}
