//! Auth-aware retry wrapper.
//!
//! Every remote operation that can fail with an expired/invalid token goes
//! through [`call_with_auth_retry`]: on an auth-classified failure it asks
//! the guardian to refresh and replays the operation, at most `max_retries`
//! times (one, everywhere in this client), so a stale token never costs the
//! user an action but retry loops stay bounded.

use crate::session::SessionGuardian;
use attar_core::{AttarError, Result};
use std::future::Future;
use tracing::{debug, warn};

/// Retry budget used by all spend/vote/letter operations.
pub const MAX_AUTH_RETRIES: u32 = 1;

/// Successful call result plus how many auth retries it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    /// The operation's value
    pub value: T,
    /// Auth-triggered replays that occurred (0 or 1 with the default budget)
    pub retries: u32,
}

/// Run `op`, refreshing the session and retrying on auth-classified errors.
///
/// Non-auth errors pass through untouched. An auth error that survives the
/// retry budget, or whose refresh fails, escalates to `SessionExpired`.
pub async fn call_with_auth_retry<T, F, Fut>(
    guardian: &SessionGuardian,
    max_retries: u32,
    op: F,
) -> Result<RetryOutcome<T>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(RetryOutcome { value, retries }),
            Err(err) if err.is_auth_related() && retries < max_retries => {
                debug!(error = %err, "auth-classified failure, refreshing session for retry");
                if !guardian.refresh().await {
                    warn!("session refresh failed during retry");
                    return Err(AttarError::session_expired(format!(
                        "refresh failed after auth error: {err}"
                    )));
                }
                retries += 1;
            }
            Err(err) if err.is_auth_related() => {
                warn!(error = %err, "auth failure persisted after retry");
                return Err(AttarError::session_expired(format!(
                    "auth failure persisted after {retries} retry: {err}"
                )));
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateHandle;
    use attar_core::effects::Clock;
    use attar_core::GuardianConfig;
    use attar_testkit::{MockBackend, MockClock};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn to_clock(clock: Arc<MockClock>) -> Arc<dyn Clock> {
        clock
    }

    fn guardian(backend: &MockBackend, clock: &Arc<MockClock>) -> SessionGuardian {
        let guardian = SessionGuardian::new(
            StateHandle::new(),
            backend.auth(),
            backend.profiles(),
            to_clock(clock.clone()),
            GuardianConfig::default(),
        );
        guardian.state().set_session(backend.mint_session());
        guardian
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let clock = MockClock::shared(0);
        let backend = MockBackend::new(clock.clone());
        let guardian = guardian(&backend, &clock);

        let outcome = call_with_auth_retry(&guardian, MAX_AUTH_RETRIES, || async { Ok(7u32) })
            .await
            .unwrap();
        assert_eq!(outcome.value, 7);
        assert_eq!(outcome.retries, 0);
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_auth_error_retries_exactly_once() {
        let clock = MockClock::shared(0);
        let backend = MockBackend::new(clock.clone());
        let guardian = guardian(&backend, &clock);

        let attempts = Arc::new(AtomicU32::new(0));
        let outcome = call_with_auth_retry(&guardian, MAX_AUTH_RETRIES, || {
            let attempts = attempts.clone();
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AttarError::auth_transient("JWT expired"))
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome.value, "done");
        assert_eq!(outcome.retries, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(backend.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_persistent_auth_error_escalates() {
        let clock = MockClock::shared(0);
        let backend = MockBackend::new(clock.clone());
        let guardian = guardian(&backend, &clock);

        let attempts = Arc::new(AtomicU32::new(0));
        let err = call_with_auth_retry(&guardian, MAX_AUTH_RETRIES, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AttarError::auth_transient("JWT expired"))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AttarError::SessionExpired { .. }));
        // One original attempt plus exactly one retry.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_short_circuits() {
        let clock = MockClock::shared(0);
        let backend = MockBackend::new(clock.clone());
        let guardian = guardian(&backend, &clock);
        backend.fail_next_refresh(AttarError::remote("refresh endpoint down"));

        let attempts = Arc::new(AtomicU32::new(0));
        let err = call_with_auth_retry(&guardian, MAX_AUTH_RETRIES, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AttarError::auth_transient("invalid token"))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AttarError::SessionExpired { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1, "no retry after failed refresh");
    }

    #[tokio::test]
    async fn test_non_auth_error_is_not_retried() {
        let clock = MockClock::shared(0);
        let backend = MockBackend::new(clock.clone());
        let guardian = guardian(&backend, &clock);

        let attempts = Arc::new(AtomicU32::new(0));
        let err = call_with_auth_retry(&guardian, MAX_AUTH_RETRIES, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AttarError::remote("constraint violation"))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AttarError::Remote { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(backend.refresh_calls(), 0);
    }
}
