//! HTTP Basic authentication against stored user passwords.

use anyhow::Result;
use axum::http::header;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::auth::context::UserContext;
use crate::auth::request::AuthRequest;
use crate::auth::strategy::{AuthStrategy, Verification, VerifyFuture};
use crate::auth::user_store::UserStore;
use crate::model::User;
use crate::types::StrategyName;

const SCHEME: &str = "Basic ";

/// Decode `Basic base64(username:password)`.
pub fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix(SCHEME)?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Applies to requests with an `Authorization: Basic ...` header.
///
/// Every failure is a generic denial so callers cannot tell unknown users from
/// wrong passwords.
pub struct HttpBasicStrategy {
    users: UserStore,
}

impl HttpBasicStrategy {
    pub const NAME: &'static str = "http_basic";

    pub fn new(users: UserStore) -> Self {
        Self { users }
    }

    async fn check(&self, request: &mut AuthRequest) -> Result<Verification> {
        let Some((username, password)) = request
            .header(header::AUTHORIZATION)
            .and_then(parse_basic_credentials)
        else {
            debug!("Malformed basic credentials");
            return Ok(Verification::denied());
        };

        let Some(record) = self.users.verify_credentials(&username, &password).await? else {
            return Ok(Verification::denied());
        };

        let user = User::from(record);
        let ctx = UserContext::for_user(&user, StrategyName::new(Self::NAME))
            .with_user_agent(request.user_agent());
        request.set_user(ctx);

        Ok(Verification::Granted)
    }
}

impl AuthStrategy for HttpBasicStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn trigger(&self, request: &AuthRequest) -> Result<bool> {
        Ok(request
            .header(header::AUTHORIZATION)
            .is_some_and(|value| value.starts_with(SCHEME)))
    }

    fn verify<'a>(&'a self, request: &'a mut AuthRequest) -> VerifyFuture<'a> {
        Box::pin(self.check(request))
    }
}
