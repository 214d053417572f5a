//! Ordered registry of authentication strategies.

use std::sync::Arc;

use anyhow::{Result, bail};

use crate::auth::strategy::AuthStrategy;

/// Strategies in registration order, keyed by unique name.
///
/// Built once before the server starts and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn AuthStrategy>>,
}

impl StrategyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy. Fails if the name is already taken.
    pub fn register(mut self, strategy: Arc<dyn AuthStrategy>) -> Result<Self> {
        if self.get(strategy.name()).is_some() {
            bail!("auth strategy '{}' is already registered", strategy.name());
        }
        self.strategies.push(strategy);
        Ok(self)
    }

    /// Append a strategy by value.
    pub fn register_strategy<S: AuthStrategy + 'static>(self, strategy: S) -> Result<Self> {
        self.register(Arc::new(strategy))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthStrategy>> {
        self.strategies.iter().find(|s| s.name() == name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AuthStrategy>> {
        self.strategies.iter()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::request::AuthRequest;
    use crate::auth::strategy::{Verification, VerifyFuture};

    struct Named(&'static str);

    impl AuthStrategy for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn trigger(&self, _request: &AuthRequest) -> anyhow::Result<bool> {
            Ok(false)
        }

        fn verify<'a>(&'a self, _request: &'a mut AuthRequest) -> VerifyFuture<'a> {
            Box::pin(async { Ok(Verification::denied()) })
        }
    }

    #[test]
    fn test_registration_order_is_kept() {
        let registry = StrategyRegistry::new()
            .register_strategy(Named("b"))
            .unwrap()
            .register_strategy(Named("a"))
            .unwrap()
            .register_strategy(Named("c"))
            .unwrap();

        assert_eq!(registry.names(), vec!["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("a").is_some());
        assert!(registry.get("z").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = StrategyRegistry::new()
            .register_strategy(Named("a"))
            .unwrap()
            .register_strategy(Named("a"));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = StrategyRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }
}
