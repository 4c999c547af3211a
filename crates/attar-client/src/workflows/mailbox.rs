//! Mailbox actions: sending letters and boosting them with moons.
//!
//! Letter votes follow the same optimistic-decrement shape as decision
//! votes, but the debit and the letter credit are one server-side ledger
//! procedure, so there is no separate record/tally pair to reconcile.

use crate::retry::{call_with_auth_retry, MAX_AUTH_RETRIES};
use crate::workflows::moons::MutationCoordinator;
use attar_core::{AttarError, Letter, LetterId, Result};
use tracing::debug;

impl MutationCoordinator {
    /// Boost a published letter with moons.
    ///
    /// Optimistically decrements the balance and bumps the cached letter's
    /// received moons, then calls the letter-vote ledger procedure with the
    /// usual single auth retry. Failure rolls both local changes back.
    pub async fn vote_on_letter(&self, letter: LetterId, amount: u32) -> Result<()> {
        if !self.guardian.ensure_valid().await {
            return Err(AttarError::session_expired("sign in to vote on letters"));
        }

        self.state.debit_moons(amount)?;
        self.state.add_letter_moons(letter, amount);

        let ledger = self.ledger.clone();
        let state = self.state.clone();
        let outcome = call_with_auth_retry(&self.guardian, MAX_AUTH_RETRIES, move || {
            let ledger = ledger.clone();
            let state = state.clone();
            async move {
                let principal = state
                    .principal()
                    .ok_or_else(|| AttarError::session_expired("signed out during letter vote"))?;
                ledger.vote_on_letter(principal, letter, amount).await
            }
        })
        .await;

        match outcome {
            Ok(retry_outcome) => {
                debug!(%letter, amount, retries = retry_outcome.retries, "letter vote committed");
                self.guardian.spawn_profile_reload();
                Ok(())
            }
            Err(err) => {
                self.state.credit_moons(amount);
                self.state.remove_letter_moons(letter, amount);
                debug!(%letter, error = %err, "letter vote rolled back");
                Err(err)
            }
        }
    }

    /// Write a letter to Attar.
    ///
    /// The sending cost is applied by the ledger procedure itself; on
    /// success the returned letter is appended to the cached mailbox and a
    /// background profile reload picks up the debited balance.
    pub async fn send_letter(&self, subject: &str, content: &str) -> Result<Letter> {
        if !self.guardian.ensure_valid().await {
            return Err(AttarError::session_expired("sign in to send letters"));
        }

        let ledger = self.ledger.clone();
        let state = self.state.clone();
        let subject = subject.to_string();
        let content = content.to_string();
        let outcome = call_with_auth_retry(&self.guardian, MAX_AUTH_RETRIES, move || {
            let ledger = ledger.clone();
            let state = state.clone();
            let subject = subject.clone();
            let content = content.clone();
            async move {
                let principal = state
                    .principal()
                    .ok_or_else(|| AttarError::session_expired("signed out during letter send"))?;
                ledger.send_letter(principal, &subject, &content).await
            }
        })
        .await?;

        let letter = outcome.value;
        debug!(letter = %letter.id, retries = outcome.retries, "letter sent");
        self.state.push_letter(letter.clone());
        self.guardian.spawn_profile_reload();
        Ok(letter)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::SessionGuardian;
    use crate::state::StateHandle;
    use crate::workflows::MutationCoordinator;
    use assert_matches::assert_matches;
    use attar_core::effects::Clock;
    use attar_core::{AttarError, GuardianConfig, Letter, LetterId, PrincipalId};
    use attar_testkit::{MockBackend, MockClock};
    use std::sync::Arc;

    fn to_clock(clock: Arc<MockClock>) -> Arc<dyn Clock> {
        clock
    }

    fn signed_in_coordinator(moons: u32) -> (MutationCoordinator, MockBackend) {
        let clock = MockClock::shared(0);
        let backend = MockBackend::new(clock.clone());
        let guardian = SessionGuardian::new(
            StateHandle::new(),
            backend.auth(),
            backend.profiles(),
            to_clock(clock),
            GuardianConfig::default(),
        );
        let session = backend.mint_session();
        backend.set_current_session(session.clone());
        guardian.state().set_session(session);
        backend.set_profile_moons(moons);
        let profile = backend.stored_profile().unwrap();
        guardian.state().set_profile(profile);
        let coordinator =
            MutationCoordinator::new(guardian, backend.ledger(), backend.records());
        (coordinator, backend)
    }

    fn cached_letter(coordinator: &MutationCoordinator) -> Letter {
        let letter = Letter {
            id: LetterId::new(),
            principal: PrincipalId::new(),
            subject: "Dear Attar".to_string(),
            content: "The garden drowned again.".to_string(),
            received_moons: 1,
            published: true,
        };
        coordinator.state().push_letter(letter.clone());
        letter
    }

    #[tokio::test]
    async fn test_vote_on_letter_commits() {
        let (coordinator, _backend) = signed_in_coordinator(13);
        let letter = cached_letter(&coordinator);

        coordinator.vote_on_letter(letter.id, 3).await.unwrap();
        assert_eq!(coordinator.state().available_moons().available(), 10);
        assert_eq!(coordinator.state().snapshot().letters[0].received_moons, 4);
    }

    #[tokio::test]
    async fn test_vote_on_letter_rolls_back_on_failure() {
        let (coordinator, backend) = signed_in_coordinator(13);
        let letter = cached_letter(&coordinator);
        backend.fail_next_letter_vote(AttarError::remote("letter unpublished"));

        let err = coordinator.vote_on_letter(letter.id, 3).await.unwrap_err();
        assert_matches!(err, AttarError::Remote { .. });
        assert_eq!(coordinator.state().available_moons().available(), 13);
        assert_eq!(coordinator.state().snapshot().letters[0].received_moons, 1);
    }

    #[tokio::test]
    async fn test_vote_on_letter_insufficient_balance() {
        let (coordinator, backend) = signed_in_coordinator(2);
        let letter = cached_letter(&coordinator);

        let err = coordinator.vote_on_letter(letter.id, 3).await.unwrap_err();
        assert_matches!(err, AttarError::InsufficientBalance { .. });
        assert_eq!(backend.letter_vote_calls(), 0);
        assert_eq!(coordinator.state().snapshot().letters[0].received_moons, 1);
    }

    #[tokio::test]
    async fn test_send_letter_appends_to_mailbox() {
        let (coordinator, _backend) = signed_in_coordinator(13);

        let letter = coordinator
            .send_letter("Dear Attar", "It rains upward here.")
            .await
            .unwrap();
        assert_eq!(letter.subject, "Dear Attar");
        let snapshot = coordinator.state().snapshot();
        assert_eq!(snapshot.letters.len(), 1);
        assert_eq!(snapshot.letters[0].id, letter.id);
    }

    #[tokio::test]
    async fn test_send_letter_retries_once_on_auth_failure() {
        let (coordinator, backend) = signed_in_coordinator(13);
        backend.fail_next_send_letter(AttarError::classify_remote("invalid token"));

        let letter = coordinator
            .send_letter("Dear Attar", "Second try.")
            .await
            .unwrap();
        assert_eq!(backend.send_letter_calls(), 2);
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(coordinator.state().snapshot().letters[0].id, letter.id);
    }

    #[tokio::test]
    async fn test_send_letter_signed_out() {
        let (coordinator, backend) = signed_in_coordinator(13);
        coordinator.state().clear_session();
        backend.clear_current_session();
        backend.fail_next_refresh(AttarError::remote("nope"));

        let err = coordinator
            .send_letter("Dear Attar", "Unsent.")
            .await
            .unwrap_err();
        assert_matches!(err, AttarError::SessionExpired { .. });
        assert!(coordinator.state().snapshot().letters.is_empty());
    }
}
