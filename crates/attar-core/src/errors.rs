//! Unified error system for the Attar client core.
//!
//! Every failure the client can encounter is captured into one enum so the
//! coordinator and guardian can return coarse-grained outcomes to the UI
//! layer instead of letting faults escape. The variants follow the client's
//! error taxonomy: session expiry, transient auth failures (recoverable via
//! one refresh+retry), local precondition failures, and remote errors.

use serde::{Deserialize, Serialize};

/// Unified error type for all Attar client operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AttarError {
    /// Session absent or provably expired; the caller must treat the client
    /// as signed out.
    #[error("Session expired: {message}")]
    SessionExpired {
        /// Context describing how expiry was detected
        message: String,
    },

    /// A remote call failed with a token/unauthorized signal. Recoverable
    /// locally via a single refresh+retry; escalates to `SessionExpired`
    /// when the retry also fails.
    #[error("Auth failure: {message}")]
    AuthTransient {
        /// The backend's auth error message
        message: String,
    },

    /// Local precondition failure; never reaches the network.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Moons the caller asked to spend
        requested: u32,
        /// Moons currently available
        available: u32,
    },

    /// Any other remote failure (network, validation, server error).
    /// Rolled back locally, surfaced with the remote message, not retried.
    #[error("Remote operation failed: {message}")]
    Remote {
        /// The remote error's message
        message: String,
    },

    /// Internal error (unexpected client-side condition)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl AttarError {
    /// Create a session-expired error
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired {
            message: message.into(),
        }
    }

    /// Create a transient auth error
    pub fn auth_transient(message: impl Into<String>) -> Self {
        Self::AuthTransient {
            message: message.into(),
        }
    }

    /// Create an insufficient-balance error
    pub fn insufficient_balance(requested: u32, available: u32) -> Self {
        Self::InsufficientBalance {
            requested,
            available,
        }
    }

    /// Create a remote operation error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this failure looks session/auth-related, meaning one
    /// refresh+retry may recover it.
    #[must_use]
    pub fn is_auth_related(&self) -> bool {
        matches!(self, Self::SessionExpired { .. } | Self::AuthTransient { .. })
    }

    /// Classify a raw backend error message into the taxonomy.
    ///
    /// The backend reports expired/invalid credentials through its message
    /// text and HTTP status; anything mentioning a token, a JWT, or a 401
    /// is treated as auth-related so the caller's single retry can kick in.
    pub fn classify_remote(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let auth_signal = lower.contains("jwt")
            || lower.contains("token")
            || lower.contains("unauthorized")
            || lower.contains("not authenticated")
            || lower.contains("401");
        if auth_signal {
            Self::AuthTransient { message }
        } else {
            Self::Remote { message }
        }
    }
}

/// Standard Result type for Attar client operations
pub type Result<T> = std::result::Result<T, AttarError>;
