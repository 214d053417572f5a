//! Strategy selection and verification for one request.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::auth::registry::StrategyRegistry;
use crate::auth::request::AuthRequest;
use crate::auth::strategy::{AuthStrategy, Verification};
use crate::types::StrategyName;

/// Authentication failures.
#[derive(Debug)]
pub enum AuthError {
    /// No registered strategy claimed the request
    NoApplicableStrategy,
    /// The chosen strategy denied the request
    VerificationFailed {
        strategy: StrategyName,
        errors: Vec<String>,
    },
    /// A strategy's predicate or verification returned an error
    StrategyFault {
        strategy: StrategyName,
        source: anyhow::Error,
    },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoApplicableStrategy => write!(f, "No applicable authentication strategy"),
            Self::VerificationFailed { strategy, errors } if errors.is_empty() => {
                write!(f, "Access denied by {}", strategy)
            }
            Self::VerificationFailed { strategy, errors } => {
                write!(f, "Access denied by {}: {}", strategy, errors.join(", "))
            }
            Self::StrategyFault { strategy, source } => {
                write!(f, "Strategy {} failed: {}", strategy, source)
            }
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StrategyFault { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

fn fault(strategy: &dyn AuthStrategy, source: anyhow::Error) -> AuthError {
    AuthError::StrategyFault {
        strategy: StrategyName::new(strategy.name()),
        source,
    }
}

/// Strategies whose predicate accepts the request, in registration order.
///
/// Every predicate is evaluated; the first predicate error aborts.
pub fn candidates(
    registry: &StrategyRegistry,
    request: &AuthRequest,
) -> Result<Vec<Arc<dyn AuthStrategy>>, AuthError> {
    let mut applicable = Vec::new();
    for strategy in registry.iter() {
        let triggered = strategy
            .trigger(request)
            .map_err(|e| fault(strategy.as_ref(), e))?;
        debug!(strategy = strategy.name(), triggered, "Evaluated auth strategy");
        if triggered {
            applicable.push(Arc::clone(strategy));
        }
    }
    Ok(applicable)
}

/// Pick the first applicable strategy and let it verify the request.
///
/// Only one strategy is ever verified; later candidates are not tried if it
/// denies. On success returns the name of the strategy that granted access.
pub async fn authenticate(
    registry: &StrategyRegistry,
    request: &mut AuthRequest,
) -> Result<StrategyName, AuthError> {
    let applicable = candidates(registry, request)?;
    debug!(count = applicable.len(), "Applicable auth strategies");

    let strategy = applicable
        .into_iter()
        .next()
        .ok_or(AuthError::NoApplicableStrategy)?;
    let name = StrategyName::new(strategy.name());

    debug!(strategy = %name, uri = %request.uri(), "Using strategy to authorize request");

    match strategy
        .verify(request)
        .await
        .map_err(|e| fault(strategy.as_ref(), e))?
    {
        Verification::Granted => Ok(name),
        Verification::Denied { errors } => Err(AuthError::VerificationFailed {
            strategy: name,
            errors,
        }),
    }
}
