//! Strategy doubles shared by the auth tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;

use crate::auth::context::UserContext;
use crate::auth::request::AuthRequest;
use crate::auth::strategy::{AuthStrategy, Verification, VerifyFuture};
use crate::types::{StrategyName, Username};

enum Failure {
    None,
    Trigger,
    Verify,
}

/// Strategy with a fixed predicate result and verification outcome that
/// counts how often it is consulted.
pub(crate) struct MockStrategy {
    name: &'static str,
    applicable: bool,
    outcome: Verification,
    failure: Failure,
    trigger_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MockStrategy {
    pub(crate) fn new(name: &'static str, applicable: bool, outcome: Verification) -> Arc<Self> {
        Arc::new(Self {
            name,
            applicable,
            outcome,
            failure: Failure::None,
            trigger_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn failing_trigger(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            failure: Failure::Trigger,
            ..Self::base(name)
        })
    }

    pub(crate) fn failing_verify(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            failure: Failure::Verify,
            ..Self::base(name)
        })
    }

    fn base(name: &'static str) -> Self {
        Self {
            name,
            applicable: true,
            outcome: Verification::Granted,
            failure: Failure::None,
            trigger_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn trigger_calls(&self) -> usize {
        self.trigger_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl AuthStrategy for MockStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn trigger(&self, _request: &AuthRequest) -> anyhow::Result<bool> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Failure::Trigger => Err(anyhow!("trigger exploded")),
            _ => Ok(self.applicable),
        }
    }

    fn verify<'a>(&'a self, request: &'a mut AuthRequest) -> VerifyFuture<'a> {
        Box::pin(async move {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if matches!(self.failure, Failure::Verify) {
                return Err(anyhow!("verify exploded"));
            }
            if self.outcome.is_granted() {
                request.set_user(UserContext::new(
                    "mock1",
                    Username::new("mockuser"),
                    Some("mock@example.org".to_string()),
                    StrategyName::new(self.name),
                ));
            }
            Ok(self.outcome.clone())
        })
    }
}
