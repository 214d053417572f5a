//! Identity of the authenticated caller for one request.

use serde::{Deserialize, Serialize};

use crate::model::User;
use crate::types::{StrategyName, Username};

/// User context placed on the request by the strategy that authenticated it.
///
/// Handlers receive it through `Extension<UserContext>`. It is immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Public key of the user record
    user_id: String,
    username: Username,
    email: Option<String>,
    /// Strategy that authenticated this user
    strategy: StrategyName,
    /// Client user agent (for logs)
    user_agent: Option<String>,
}

impl UserContext {
    /// Create a new user context.
    pub fn new(
        user_id: impl Into<String>,
        username: Username,
        email: Option<String>,
        strategy: StrategyName,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username,
            email,
            strategy,
            user_agent: None,
        }
    }

    /// Context for a stored user authenticated by `strategy`.
    pub fn for_user(user: &User, strategy: StrategyName) -> Self {
        Self::new(
            user.id.clone(),
            user.username.clone(),
            user.email.clone(),
            strategy,
        )
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn strategy(&self) -> &StrategyName {
        &self.strategy
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "alice1".to_string(),
            username: Username::new("alice"),
            email: Some("alice@example.org".to_string()),
            bio: String::new(),
            bio_html: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_for_user() {
        let ctx = UserContext::for_user(&user(), StrategyName::new("http_basic"));

        assert_eq!(ctx.user_id(), "alice1");
        assert_eq!(ctx.username().as_str(), "alice");
        assert_eq!(ctx.email(), Some("alice@example.org"));
        assert_eq!(ctx.strategy().as_str(), "http_basic");
        assert_eq!(ctx.user_agent(), None);
    }

    #[test]
    fn test_with_user_agent() {
        let ctx = UserContext::for_user(&user(), StrategyName::new("access_token"))
            .with_user_agent(Some("curl/8.0".to_string()));
        assert_eq!(ctx.user_agent(), Some("curl/8.0"));
    }
}
