//! Clock effect trait.

/// Wall-clock time source for expiry prediction and quiet-period checks.
///
/// Kept synchronous: `ensure_valid`'s fast path must stay cheap and
/// non-blocking, and tests substitute a manually advanced clock.
pub trait Clock: Send + Sync {
    /// Current wall-clock time, epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// System clock backed by `std::time::SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(std::time::Duration::ZERO)
            .as_millis() as u64
    }
}
