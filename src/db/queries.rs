// Query helpers for media entries and access tokens.
//
// User accounts live in `auth::UserStore`; everything here is a thin
// SurrealQL wrapper returning the raw records.

use crate::db::schema::*;
use crate::types::{TokenHash, TokenPrefix};
use anyhow::{Result, anyhow};
use surrealdb::RecordId;
use surrealdb::{Surreal, engine::any::Any};

pub struct QueryBuilder;

impl QueryBuilder {
    /// Create a new media entry.
    pub async fn create_media_entry(
        db: &Surreal<Any>,
        data: &MediaEntryCreate,
    ) -> Result<MediaEntryRecord> {
        let mut res = db
            .query(
                r#"
                CREATE media_entry SET
                    uploader = $uploader,
                    title = $title,
                    slug = $slug,
                    description = $description,
                    description_html = $description_html,
                    license = $license,
                    media_type = $media_type,
                    state = $state,
                    media_files = $media_files,
                    created_at = time::now()
                "#,
            )
            .bind(("uploader", data.uploader.clone()))
            .bind(("title", data.title.clone()))
            .bind(("slug", data.slug.clone()))
            .bind(("description", data.description.clone()))
            .bind(("description_html", data.description_html.clone()))
            .bind(("license", data.license.clone()))
            .bind(("media_type", data.media_type.clone()))
            .bind(("state", data.state.as_str().to_string()))
            .bind(("media_files", data.media_files.clone()))
            .await?;

        let created: Option<MediaEntryRecord> = res.take(0)?;
        created.ok_or_else(|| anyhow!("failed to create media entry record"))
    }

    pub async fn find_media_entry_by_id(
        db: &Surreal<Any>,
        entry_id: RecordId,
    ) -> Result<Option<MediaEntryRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT * FROM media_entry
                WHERE id = $id
                LIMIT 1
                "#,
            )
            .bind(("id", entry_id))
            .await?;

        let entry: Option<MediaEntryRecord> = res.take(0)?;
        Ok(entry)
    }

    /// Entries in `state`, newest first.
    pub async fn list_media_entries_by_state(
        db: &Surreal<Any>,
        state: &str,
        limit: u32,
    ) -> Result<Vec<MediaEntryRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT * FROM media_entry
                WHERE state = $state
                ORDER BY created_at DESC
                LIMIT $limit
                "#,
            )
            .bind(("state", state.to_string()))
            .bind(("limit", limit))
            .await?;

        let entries: Vec<MediaEntryRecord> = res.take(0)?;
        Ok(entries)
    }

    pub async fn create_access_token(
        db: &Surreal<Any>,
        data: &AccessTokenCreate,
    ) -> Result<AccessTokenRecord> {
        let mut res = db
            .query(
                r#"
                CREATE access_token SET
                    token_hash = $token_hash,
                    token_prefix = $token_prefix,
                    user_id = $user_id,
                    name = $name,
                    is_active = true,
                    expires_at = $expires_at,
                    created_at = time::now(),
                    last_used_at = NONE
                "#,
            )
            .bind(("token_hash", data.token_hash.clone()))
            .bind(("token_prefix", data.token_prefix.clone()))
            .bind(("user_id", data.user_id.clone()))
            .bind(("name", data.name.clone()))
            .bind(("expires_at", data.expires_at.clone()))
            .await?;

        let created: Option<AccessTokenRecord> = res.take(0)?;
        created.ok_or_else(|| anyhow!("failed to create access token record"))
    }

    pub async fn find_access_token_by_hash(
        db: &Surreal<Any>,
        token_hash: &TokenHash,
    ) -> Result<Option<AccessTokenRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT * FROM access_token
                WHERE token_hash = $token_hash
                LIMIT 1
                "#,
            )
            .bind(("token_hash", token_hash.clone()))
            .await?;

        let token: Option<AccessTokenRecord> = res.take(0)?;
        Ok(token)
    }

    pub async fn list_access_tokens(
        db: &Surreal<Any>,
        active_only: bool,
    ) -> Result<Vec<AccessTokenRecord>> {
        let query = if active_only {
            "SELECT * FROM access_token WHERE is_active = true ORDER BY created_at DESC"
        } else {
            "SELECT * FROM access_token ORDER BY created_at DESC"
        };

        let mut res = db.query(query).await?;
        let tokens: Vec<AccessTokenRecord> = res.take(0)?;
        Ok(tokens)
    }

    /// Record a successful authentication with this token.
    pub async fn update_access_token_last_used(
        db: &Surreal<Any>,
        token_id: &RecordId,
    ) -> Result<()> {
        db.query(
            r#"
            UPDATE access_token
            SET last_used_at = time::now()
            WHERE id = $id
            "#,
        )
        .bind(("id", token_id.clone()))
        .await?;

        Ok(())
    }

    /// Revoke every token with this prefix. Returns whether any matched.
    pub async fn deactivate_access_token_by_prefix(
        db: &Surreal<Any>,
        token_prefix: &TokenPrefix,
    ) -> Result<bool> {
        let mut res = db
            .query(
                r#"
                UPDATE access_token
                SET is_active = false
                WHERE token_prefix = $token_prefix
                RETURN AFTER
                "#,
            )
            .bind(("token_prefix", token_prefix.clone()))
            .await?;

        let revoked: Vec<AccessTokenRecord> = res.take(0)?;
        Ok(!revoked.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::memory_db;
    use crate::model::MediaState;
    use std::collections::BTreeMap;

    fn entry_create(title: &str, state: MediaState) -> MediaEntryCreate {
        let mut media_files = BTreeMap::new();
        media_files.insert(
            "original".to_string(),
            vec!["media_entries".to_string(), "1".to_string(), "orig.jpg".to_string()],
        );

        MediaEntryCreate {
            uploader: RecordId::from_table_key("user", "alice"),
            title: title.to_string(),
            slug: Some(title.to_lowercase()),
            description: String::new(),
            description_html: String::new(),
            license: None,
            media_type: "mediagoblin.media_types.image".to_string(),
            state,
            media_files,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_media_entry() {
        let db = memory_db().await;

        let created = QueryBuilder::create_media_entry(&db, &entry_create("Sunset", MediaState::Processed))
            .await
            .unwrap();
        assert_eq!(created.title, "Sunset");
        assert!(created.created_at.is_some());

        let found = QueryBuilder::find_media_entry_by_id(&db, created.id.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.media_files["original"].len(), 3);
    }

    #[tokio::test]
    async fn test_find_missing_media_entry() {
        let db = memory_db().await;
        let found = QueryBuilder::find_media_entry_by_id(
            &db,
            RecordId::from_table_key("media_entry", "nope"),
        )
        .await
        .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_state_and_limits() {
        let db = memory_db().await;

        for title in ["One", "Two", "Three"] {
            QueryBuilder::create_media_entry(&db, &entry_create(title, MediaState::Processed))
                .await
                .unwrap();
        }
        QueryBuilder::create_media_entry(&db, &entry_create("Broken", MediaState::Failed))
            .await
            .unwrap();

        let processed = QueryBuilder::list_media_entries_by_state(&db, "processed", 10)
            .await
            .unwrap();
        assert_eq!(processed.len(), 3);
        assert!(processed.iter().all(|e| e.state == "processed"));

        let limited = QueryBuilder::list_media_entries_by_state(&db, "processed", 2)
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_access_token_lifecycle() {
        let db = memory_db().await;

        let created = QueryBuilder::create_access_token(
            &db,
            &AccessTokenCreate {
                token_hash: TokenHash::new("deadbeef"),
                token_prefix: TokenPrefix::new("mg_abc12345"),
                user_id: RecordId::from_table_key("user", "alice"),
                name: Some("laptop".to_string()),
                expires_at: None,
            },
        )
        .await
        .unwrap();
        assert!(created.is_active);

        let found = QueryBuilder::find_access_token_by_hash(&db, &TokenHash::new("deadbeef"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        QueryBuilder::update_access_token_last_used(&db, &found.id)
            .await
            .unwrap();

        let revoked =
            QueryBuilder::deactivate_access_token_by_prefix(&db, &TokenPrefix::new("mg_abc12345"))
                .await
                .unwrap();
        assert!(revoked);

        let active = QueryBuilder::list_access_tokens(&db, true).await.unwrap();
        assert!(active.is_empty());

        let all = QueryBuilder::list_access_tokens(&db, false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_revoke_unknown_prefix() {
        let db = memory_db().await;
        let revoked =
            QueryBuilder::deactivate_access_token_by_prefix(&db, &TokenPrefix::new("mg_missing"))
                .await
                .unwrap();
        assert!(!revoked);
    }
}
