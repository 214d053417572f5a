//! The pluggable authentication unit.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::auth::request::AuthRequest;

/// Boxed future returned by [`AuthStrategy::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<Verification>> + Send + 'a>>;

/// Outcome of a strategy's verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The strategy accepted the request and set the identity slot.
    Granted,
    /// The strategy rejected the request. An empty list means a generic denial.
    Denied { errors: Vec<String> },
}

impl Verification {
    /// Denial without error descriptors.
    pub fn denied() -> Self {
        Self::Denied { errors: Vec::new() }
    }

    pub fn denied_with<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Denied {
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// A named authentication strategy.
///
/// Strategies are registered once at startup and shared between requests, so
/// they must not keep per-request state.
pub trait AuthStrategy: Send + Sync {
    /// Unique registry name (e.g. "http_basic").
    fn name(&self) -> &str;

    /// Whether this strategy applies to the request. Must not mutate it.
    fn trigger(&self, request: &AuthRequest) -> Result<bool>;

    /// Verify the request, filling the identity slot on success.
    fn verify<'a>(&'a self, request: &'a mut AuthRequest) -> VerifyFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_with_collects_errors() {
        let denied = Verification::denied_with(["bad token", "try again"]);
        assert_eq!(
            denied,
            Verification::Denied {
                errors: vec!["bad token".to_string(), "try again".to_string()]
            }
        );
        assert!(!denied.is_granted());
    }

    #[test]
    fn test_generic_denial_is_empty() {
        assert_eq!(Verification::denied(), Verification::Denied { errors: vec![] });
        assert!(Verification::Granted.is_granted());
    }
}
