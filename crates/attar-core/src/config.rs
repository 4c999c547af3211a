//! Session guardian configuration.

use serde::{Deserialize, Serialize};

/// Timing knobs for the session guardian.
///
/// Defaults match the deployed client: refresh proactively when the session
/// is within five minutes of expiry, run the periodic refresh every thirty
/// minutes, and suppress visibility-triggered refreshes for five minutes
/// after the last successful one so rapid tab switching does not cause a
/// refresh storm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Refresh when the session expires within this window
    pub expiry_lookahead_ms: u64,
    /// Interval for the periodic background refresh
    pub refresh_interval_ms: u64,
    /// Minimum gap between a successful refresh and the next
    /// visibility-triggered one
    pub min_quiet_period_ms: u64,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            expiry_lookahead_ms: 5 * 60 * 1000,
            refresh_interval_ms: 30 * 60 * 1000,
            min_quiet_period_ms: 5 * 60 * 1000,
        }
    }
}
