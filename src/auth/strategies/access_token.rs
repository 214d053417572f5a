//! Access tokens passed as the `access_token` query parameter.

use anyhow::{Result, anyhow};
use chrono::{TimeDelta, Utc};
use sha2::{Digest, Sha256};
use surrealdb::RecordId;
use tracing::{debug, warn};

use crate::auth::context::UserContext;
use crate::auth::request::AuthRequest;
use crate::auth::strategy::{AuthStrategy, Verification, VerifyFuture};
use crate::auth::user_store::UserStore;
use crate::db::schema::{AccessTokenCreate, AccessTokenRecord, to_chrono};
use crate::db::{Db, QueryBuilder};
use crate::model::User;
use crate::types::{StrategyName, TokenHash, TokenPrefix};

/// Query-string parameter carrying the token.
pub const QUERY_PARAM: &str = "access_token";

pub const INVALID_TOKEN: &str = "Invalid access token";
pub const TOKEN_REVOKED: &str = "Access token revoked";
pub const TOKEN_EXPIRED: &str = "Access token expired";
pub const USER_DEACTIVATED: &str = "User account is deactivated";

/// Hash an access token using SHA-256.
pub fn hash_access_token(token: &str) -> TokenHash {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    TokenHash::new(format!("{:x}", result))
}

/// Generate a new token with the format: prefix_randompart
/// Returns (full_token, prefix, hash)
pub fn generate_access_token() -> (String, TokenPrefix, TokenHash) {
    use uuid::Uuid;

    let prefix = TokenPrefix::new(format!("mg_{}", &Uuid::new_v4().simple().to_string()[..8]));
    let secret = Uuid::new_v4().simple().to_string();
    let full_token = format!("{}_{}", prefix, secret);
    let token_hash = hash_access_token(&full_token);

    (full_token, prefix, token_hash)
}

/// Create and store a token for `user_id`. The raw token is only returned here.
pub async fn issue_access_token(
    db: &Db,
    user_id: RecordId,
    name: Option<String>,
    expires_in_days: Option<i64>,
) -> Result<(String, AccessTokenRecord)> {
    let expires_at = match expires_in_days {
        Some(days) => {
            let expires = TimeDelta::try_days(days)
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .ok_or_else(|| anyhow!("expiry of {} days is out of range", days))?;
            Some(surrealdb::sql::Datetime::from(expires))
        }
        None => None,
    };
    let (token, token_prefix, token_hash) = generate_access_token();

    let record = QueryBuilder::create_access_token(
        db,
        &AccessTokenCreate {
            token_hash,
            token_prefix,
            user_id,
            name,
            expires_at,
        },
    )
    .await?;

    Ok((token, record))
}

/// Applies whenever the query string carries an `access_token`.
pub struct AccessTokenStrategy {
    db: Db,
    users: UserStore,
}

impl AccessTokenStrategy {
    pub const NAME: &'static str = "access_token";

    pub fn new(db: Db) -> Self {
        let users = UserStore::new(db.clone());
        Self { db, users }
    }

    async fn check(&self, request: &mut AuthRequest) -> Result<Verification> {
        let Some(token) = request.query_param(QUERY_PARAM) else {
            return Ok(Verification::denied_with([INVALID_TOKEN]));
        };

        let token_hash = hash_access_token(&token);
        let Some(record) = QueryBuilder::find_access_token_by_hash(&self.db, &token_hash).await?
        else {
            debug!("Unknown access token");
            return Ok(Verification::denied_with([INVALID_TOKEN]));
        };

        if !record.is_active {
            debug!(prefix = %record.token_prefix, "Access token revoked");
            return Ok(Verification::denied_with([TOKEN_REVOKED]));
        }

        if let Some(expires) = to_chrono(record.expires_at.clone())
            && expires < Utc::now()
        {
            debug!(prefix = %record.token_prefix, "Access token expired");
            return Ok(Verification::denied_with([TOKEN_EXPIRED]));
        }

        let user = match self.users.get_user_by_id(&record.user_id).await? {
            Some(user) if user.is_active => User::from(user),
            _ => return Ok(Verification::denied_with([USER_DEACTIVATED])),
        };

        if let Err(e) = QueryBuilder::update_access_token_last_used(&self.db, &record.id).await {
            warn!(prefix = %record.token_prefix, error = %e, "Failed to record token use");
        }

        let ctx = UserContext::for_user(&user, StrategyName::new(Self::NAME))
            .with_user_agent(request.user_agent());
        request.set_user(ctx);

        Ok(Verification::Granted)
    }
}

impl AuthStrategy for AccessTokenStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn trigger(&self, request: &AuthRequest) -> Result<bool> {
        Ok(request.query_param(QUERY_PARAM).is_some())
    }

    fn verify<'a>(&'a self, request: &'a mut AuthRequest) -> VerifyFuture<'a> {
        Box::pin(self.check(request))
    }
}
