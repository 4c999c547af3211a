//! Mutation workflows: moon spends, decision votes, and mailbox actions.

mod mailbox;
mod moons;

pub use moons::{MutationCoordinator, MutationState, SpendIntent, SpendPurpose, SpendReceipt};
