//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `UserId` where a
//! `WalletAddress` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
///
/// `$generate` decides how fresh values are produced.
macro_rules! typed_id {
    ($name:ident, $doc:expr, $generate:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh identifier.
            #[must_use]
            pub fn new() -> Self {
                Self($generate())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.", Uuid::now_v7);
typed_id!(
    WalletAddress,
    "Globally unique wallet address. Random 128-bit value, never reused.",
    Uuid::new_v4
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wallet_address_is_random_v4() {
        let a = WalletAddress::new();
        let b = WalletAddress::new();
        assert_ne!(a, b);
        assert_eq!(a.into_inner().get_version_num(), 4);
    }

    #[test]
    fn test_user_id_is_time_ordered() {
        let id = UserId::new();
        assert_eq!(id.into_inner().get_version_num(), 7);
    }

    #[test]
    fn test_display_and_parse_round_trip() {
        let address = WalletAddress::new();
        let parsed = WalletAddress::from_str(&address.to_string()).unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(WalletAddress::from_str("not-an-address").is_err());
        assert!(UserId::from_str("").is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let address = WalletAddress::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
