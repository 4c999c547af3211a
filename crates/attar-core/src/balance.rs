//! Moon balance value type.
//!
//! The balance is non-negative by construction and every mutation returns a
//! new value instead of mutating in place. The optimistic-spend path debits
//! before the remote call and credits back on failure; keeping both
//! directions as pure value operations lets the rollback path be tested
//! without any network involvement.

use crate::errors::{AttarError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative spendable moon counter attached to a principal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MoonBalance(u32);

impl MoonBalance {
    /// Create a balance with the given number of moons
    pub fn new(moons: u32) -> Self {
        Self(moons)
    }

    /// Moons currently available
    pub fn available(&self) -> u32 {
        self.0
    }

    /// Whether the balance covers a spend of `amount`
    pub fn covers(&self, amount: u32) -> bool {
        self.0 >= amount
    }

    /// Debit `amount`, returning the new balance.
    ///
    /// Fails with `InsufficientBalance` instead of going negative; the
    /// caller must not have issued any remote call yet when this fails.
    pub fn debit(&self, amount: u32) -> Result<Self> {
        self.0
            .checked_sub(amount)
            .map(Self)
            .ok_or_else(|| AttarError::insufficient_balance(amount, self.0))
    }

    /// Credit `amount`, returning the new balance. Saturates at `u32::MAX`.
    pub fn credit(&self, amount: u32) -> Self {
        Self(self.0.saturating_add(amount))
    }
}

impl fmt::Display for MoonBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} moons", self.0)
    }
}

impl From<u32> for MoonBalance {
    fn from(moons: u32) -> Self {
        Self(moons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_debit_success() {
        let balance = MoonBalance::new(13);
        let after = balance.debit(5).unwrap();
        assert_eq!(after.available(), 8);
        // Original value untouched
        assert_eq!(balance.available(), 13);
    }

    #[test]
    fn test_debit_overdraft() {
        let balance = MoonBalance::new(3);
        let err = balance.debit(5).unwrap_err();
        assert_eq!(
            err,
            AttarError::insufficient_balance(5, 3),
            "overdraft must report requested and available amounts"
        );
        assert_eq!(balance.available(), 3);
    }

    #[test]
    fn test_credit_saturates() {
        let balance = MoonBalance::new(u32::MAX - 1);
        assert_eq!(balance.credit(10).available(), u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_debit_then_credit_restores(start in 0u32..=1_000_000, amount in 0u32..=1_000_000) {
            let balance = MoonBalance::new(start);
            match balance.debit(amount) {
                Ok(after) => {
                    prop_assert!(amount <= start);
                    prop_assert_eq!(after.credit(amount), balance);
                }
                Err(_) => prop_assert!(amount > start),
            }
        }

        #[test]
        fn prop_covers_matches_debit(start in 0u32..=1_000_000, amount in 0u32..=1_000_000) {
            let balance = MoonBalance::new(start);
            prop_assert_eq!(balance.covers(amount), balance.debit(amount).is_ok());
        }
    }
}
