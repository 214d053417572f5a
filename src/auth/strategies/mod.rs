//! Built-in authentication strategies.

mod access_token;
mod http_basic;

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use crate::auth::registry::StrategyRegistry;
use crate::auth::strategy::AuthStrategy;
use crate::auth::user_store::UserStore;
use crate::db::Db;
use crate::types::StrategyName;

pub use access_token::{
    AccessTokenStrategy, INVALID_TOKEN, TOKEN_EXPIRED, TOKEN_REVOKED, USER_DEACTIVATED,
    generate_access_token, hash_access_token, issue_access_token,
};
pub use http_basic::{HttpBasicStrategy, parse_basic_credentials};

/// Names accepted by [`build_strategy`].
pub const BUILTIN_STRATEGIES: [&str; 2] = [HttpBasicStrategy::NAME, AccessTokenStrategy::NAME];

/// Instantiate a built-in strategy by name.
pub fn build_strategy(name: &StrategyName, db: &Db) -> Result<Arc<dyn AuthStrategy>> {
    let strategy: Arc<dyn AuthStrategy> = match name.as_str() {
        HttpBasicStrategy::NAME => Arc::new(HttpBasicStrategy::new(UserStore::new(db.clone()))),
        AccessTokenStrategy::NAME => Arc::new(AccessTokenStrategy::new(db.clone())),
        other => bail!(
            "unknown auth strategy '{}' (available: {})",
            other,
            BUILTIN_STRATEGIES.join(", ")
        ),
    };
    Ok(strategy)
}

/// Registry with the named built-in strategies, in the given order.
pub fn build_registry(names: &[StrategyName], db: &Db) -> Result<StrategyRegistry> {
    let mut registry = StrategyRegistry::new();
    for name in names {
        registry = registry.register(build_strategy(name, db)?)?;
    }
    info!(strategies = ?registry.names(), "Registered auth strategies");
    Ok(registry)
}
