//! Core identifier types used across the Attar client.
//!
//! Each backend row family gets its own newtype so principal, environment,
//! letter, and vote identifiers cannot be confused at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(raw)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Authenticated identity identifier
    ///
    /// A principal has at most one active session at a time and owns a
    /// profile row (with its moon balance) on the backend.
    PrincipalId,
    "principal"
);

define_id!(
    /// Environment (narrative day) identifier
    EnvId,
    "env"
);

define_id!(
    /// Mailbox letter identifier
    LetterId,
    "letter"
);

define_id!(
    /// Vote record identifier
    VoteId,
    "vote"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let id = PrincipalId::new();
        let displayed = id.to_string();
        assert!(displayed.starts_with("principal-"));
        let parsed: PrincipalId = displayed.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: EnvId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.uuid(), uuid);
    }

    #[test]
    fn test_distinct_ids() {
        assert_ne!(LetterId::new(), LetterId::new());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = VoteId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: VoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
