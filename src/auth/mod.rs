//! Pluggable request authentication.
//!
//! Strategies are registered by name in a [`StrategyRegistry`]. For every
//! protected request the selector asks each strategy whether it applies, picks
//! the first one that does and lets it verify the request:
//!
//! - **http_basic**: `Authorization: Basic ...` checked against stored bcrypt
//!   password hashes
//! - **access_token**: `?access_token=...` looked up by SHA-256 hash
//!
//! ## Usage
//!
//! ```ignore
//! let registry = Arc::new(build_registry(&config.strategies, &db)?);
//! let api = protect(Router::new().route("/api/test", get(api_test)), registry);
//! ```

mod context;
mod middleware;
mod registry;
mod request;
mod selector;
pub mod strategies;
mod strategy;
mod user_store;

#[cfg(test)]
pub(crate) mod testing;

pub use context::UserContext;
pub use middleware::protect;
pub use registry::StrategyRegistry;
pub use request::AuthRequest;
pub use selector::{AuthError, authenticate, candidates};
pub use strategies::build_registry;
pub use strategy::{AuthStrategy, Verification, VerifyFuture};
pub use user_store::{UserStore, validate_username};

#[cfg(test)]
pub(crate) use user_store::test_store;
