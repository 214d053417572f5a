//! NewType wrappers for strong typing across the API.
//!
//! These types keep semantically different strings apart (e.g. passing a
//! token prefix where a token hash is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Registered name of an authentication strategy (e.g. "http_basic").
    ///
    /// Names are unique within a registry and are recorded on the user
    /// context so handlers and logs can tell how a request was authenticated.
    StrategyName
);

newtype_string!(
    /// Public username, as used in profile URLs (`/u/{username}/`).
    Username
);

newtype_string!(
    /// Role of a media file within an entry (e.g. "original", "thumb").
    FileRole
);

newtype_string!(
    /// SHA-256 hash of an access token for storage and lookup.
    ///
    /// Raw tokens are never stored. They are hashed once when created or
    /// received and compared by hash.
    TokenHash
);

newtype_string!(
    /// Displayable prefix of an access token (e.g. "mg_abc12345").
    ///
    /// Safe to show in listings; it cannot be used to authenticate.
    TokenPrefix
);
