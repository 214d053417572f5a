//! Route layer gating handlers behind the strategy registry.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::api::response::{Cors, json_response_with_status};
use crate::auth::registry::StrategyRegistry;
use crate::auth::request::AuthRequest;
use crate::auth::selector::{AuthError, authenticate};

#[derive(Serialize)]
struct DenialBody {
    status: u16,
    errors: Vec<String>,
}

/// Wrap every route of `router` with authentication.
///
/// Granted requests reach the handler with a `UserContext` extension (when
/// the strategy set one); all others are answered here.
pub fn protect<S>(router: Router<S>, registry: Arc<StrategyRegistry>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(registry, require_auth))
}

async fn require_auth(
    State(registry): State<Arc<StrategyRegistry>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let mut auth_request = AuthRequest::new(parts);

    match authenticate(&registry, &mut auth_request).await {
        Ok(strategy) => {
            let (mut parts, user) = auth_request.into_parts();
            match user {
                Some(user) => {
                    parts.extensions.insert(user);
                }
                None => warn!(%strategy, "Strategy granted access without setting a user"),
            }
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        Err(err) => deny(err),
    }
}

/// Render an authentication failure.
fn deny(err: AuthError) -> Result<Response, ApiError> {
    match err {
        AuthError::NoApplicableStrategy => {
            info!("No applicable authentication strategy, access denied");
            Ok(StatusCode::FORBIDDEN.into_response())
        }
        AuthError::VerificationFailed { strategy, errors } if errors.is_empty() => {
            info!(%strategy, "Access denied");
            Ok(StatusCode::FORBIDDEN.into_response())
        }
        AuthError::VerificationFailed { strategy, errors } => {
            info!(%strategy, ?errors, "Access denied");
            json_response_with_status(
                StatusCode::FORBIDDEN,
                &DenialBody {
                    status: StatusCode::FORBIDDEN.as_u16(),
                    errors,
                },
                Cors::Allow,
            )
        }
        fault @ AuthError::StrategyFault { .. } => Err(ApiError::Internal(fault.to_string())),
    }
}
