//! User storage and password checks.

use anyhow::{Context, Result, anyhow, bail};
use surrealdb::RecordId;
use tracing::debug;

use crate::db::Db;
use crate::db::schema::{UserCreate, UserRecord};

/// bcrypt cost for new password hashes.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Usernames are URL path segments, so keep them to a safe alphabet.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() || username.len() > 30 {
        bail!("username must be between 1 and 30 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        bail!("username may only contain letters, digits, '_', '-' and '.'");
    }
    Ok(())
}

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|e| anyhow!("Password hashing failed: {}", e))
}

pub fn verify_password_hash(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).map_err(|e| anyhow!("Password verification failed: {}", e))
}

/// User store for database operations.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
    bcrypt_cost: u32,
}

impl UserStore {
    /// Create a new user store.
    pub fn new(db: Db) -> Self {
        Self {
            db,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Create a new user with a bcrypt-hashed password.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<UserRecord> {
        validate_username(username)?;
        if self.get_user_by_username(username).await?.is_some() {
            bail!("user '{}' already exists", username);
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let pw_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .context("password hashing task failed")??;

        let create = UserCreate {
            username: username.to_string(),
            email: email.map(|s| s.to_string()),
            bio: None,
            bio_html: None,
            pw_hash,
        };

        let query = r#"
            CREATE user CONTENT {
                username: $username,
                email: $email,
                bio: $bio,
                bio_html: $bio_html,
                pw_hash: $pw_hash,
                is_active: true,
                created_at: time::now(),
                updated_at: time::now()
            }
        "#;

        let mut res = self
            .db
            .query(query)
            .bind(("username", create.username))
            .bind(("email", create.email))
            .bind(("bio", create.bio))
            .bind(("bio_html", create.bio_html))
            .bind(("pw_hash", create.pw_hash))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create user"))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let query = "SELECT * FROM user WHERE username = $username LIMIT 1";

        let mut res = self
            .db
            .query(query)
            .bind(("username", username.to_string()))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Get a user by database ID.
    pub async fn get_user_by_id(&self, user_id: &RecordId) -> Result<Option<UserRecord>> {
        let query = "SELECT * FROM user WHERE id = $id LIMIT 1";

        let mut res = self.db.query(query).bind(("id", user_id.clone())).await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Active user whose password matches, if any.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>> {
        let Some(user) = self.get_user_by_username(username).await? else {
            debug!(username, "Unknown user");
            return Ok(None);
        };
        if !user.is_active {
            debug!(username, "User is deactivated");
            return Ok(None);
        }

        let password = password.to_string();
        let hash = user.pw_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password_hash(&password, &hash))
            .await
            .context("password verification task failed")??;

        if matches {
            Ok(Some(user))
        } else {
            debug!(username, "Password mismatch");
            Ok(None)
        }
    }

    /// Update the free-text bio and its rendered html.
    pub async fn set_bio(&self, user_id: &RecordId, bio: &str, bio_html: &str) -> Result<()> {
        let query = r#"
            UPDATE user SET
                bio = $bio,
                bio_html = $bio_html,
                updated_at = time::now()
            WHERE id = $id
        "#;

        self.db
            .query(query)
            .bind(("id", user_id.clone()))
            .bind(("bio", bio.to_string()))
            .bind(("bio_html", bio_html.to_string()))
            .await?;

        Ok(())
    }

    /// Deactivate a user account.
    pub async fn deactivate_user(&self, user_id: &RecordId) -> Result<()> {
        self.set_active(user_id, false).await
    }

    /// Reactivate a user account.
    pub async fn reactivate_user(&self, user_id: &RecordId) -> Result<()> {
        self.set_active(user_id, true).await
    }

    async fn set_active(&self, user_id: &RecordId, active: bool) -> Result<()> {
        let query = r#"
            UPDATE user SET
                is_active = $active,
                updated_at = time::now()
            WHERE id = $id
        "#;

        self.db
            .query(query)
            .bind(("id", user_id.clone()))
            .bind(("active", active))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn test_store() -> UserStore {
    let db = crate::db::connection::memory_db().await;
    UserStore::new(db).with_bcrypt_cost(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_d9").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username("al/ice").is_err());
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let store = test_store().await;

        let user = store
            .create_user("alice", "s3cret", Some("alice@example.org"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.is_active);
        assert_ne!(user.pw_hash, "s3cret");

        let by_name = store.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        let by_id = store.get_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email.as_deref(), Some("alice@example.org"));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = test_store().await;
        store.create_user("alice", "one", None).await.unwrap();

        let err = store.create_user("alice", "two", None).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let store = test_store().await;
        store.create_user("alice", "s3cret", None).await.unwrap();

        assert!(store.verify_credentials("alice", "s3cret").await.unwrap().is_some());
        assert!(store.verify_credentials("alice", "wrong").await.unwrap().is_none());
        assert!(store.verify_credentials("bob", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_log_in() {
        let store = test_store().await;
        let user = store.create_user("alice", "s3cret", None).await.unwrap();

        store.deactivate_user(&user.id).await.unwrap();
        assert!(store.verify_credentials("alice", "s3cret").await.unwrap().is_none());

        store.reactivate_user(&user.id).await.unwrap();
        assert!(store.verify_credentials("alice", "s3cret").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_bio() {
        let store = test_store().await;
        let user = store.create_user("alice", "pw", None).await.unwrap();

        store
            .set_bio(&user.id, "Painter", "<p>Painter</p>")
            .await
            .unwrap();

        let updated = store.get_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Painter"));
        assert_eq!(updated.bio_html.as_deref(), Some("<p>Painter</p>"));
    }
}
