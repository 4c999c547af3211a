//! Core types for the Attar client.
//!
//! This crate holds everything the client orchestration layer shares:
//! identifier newtypes, the domain records mirrored from backend rows, the
//! unified error type, the moon-balance value type, guardian configuration,
//! and the effect traits describing the narrow capability set the client
//! calls through (`{auth, ledger, records, profile, clock}`).
//!
//! The backend service itself (authentication, SQL, stored procedures) is an
//! external collaborator; nothing here reimplements it.

pub mod balance;
pub mod config;
pub mod domain;
pub mod effects;
pub mod errors;
pub mod identifiers;

pub use balance::MoonBalance;
pub use config::GuardianConfig;
pub use domain::{EnvChoice, EnvSnapshot, Letter, Profile, Session, Votable, VoteRecord};
pub use errors::{AttarError, Result};
pub use identifiers::{EnvId, LetterId, PrincipalId, VoteId};
