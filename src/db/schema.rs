use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{RecordId, sql::Datetime};

use crate::model::{MediaEntry, MediaState, User};
use crate::types::{FileRole, TokenHash, TokenPrefix, Username};

/// Public key of a record id (`media_entry:abc123` -> `abc123`).
///
/// String, number and uuid keys are returned as their plain value. Array and
/// object keys keep their SurrealQL rendering.
pub fn record_key(id: &RecordId) -> String {
    let key = id.key().clone();
    if let Ok(key) = String::try_from(key.clone()) {
        return key;
    }
    if let Ok(key) = i64::try_from(key.clone()) {
        return key.to_string();
    }
    if let Ok(key) = uuid::Uuid::try_from(key) {
        return key.to_string();
    }

    let rendered = id.to_string();
    match rendered.split_once(':') {
        Some((_, key)) => key.to_string(),
        None => rendered,
    }
}

pub fn to_chrono(dt: Option<Datetime>) -> Option<DateTime<Utc>> {
    dt.map(DateTime::<Utc>::from)
}

/// Persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Database identifier
    pub id: RecordId,
    /// Unique public username
    pub username: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    /// Bio already rendered to html by the web frontend
    pub bio_html: Option<String>,
    /// bcrypt hash of the password
    pub pw_hash: String,
    pub is_active: bool,
    pub created_at: Option<Datetime>,
    pub updated_at: Option<Datetime>,
}

/// Payload for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub bio_html: Option<String>,
    pub pw_hash: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record_key(&record.id),
            username: Username::new(record.username),
            email: record.email,
            bio: record.bio.unwrap_or_default(),
            bio_html: record.bio_html.unwrap_or_default(),
            is_active: record.is_active,
        }
    }
}

/// Persisted media entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntryRecord {
    /// Database identifier
    pub id: RecordId,
    /// Reference to the uploading user
    pub uploader: RecordId,
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    pub license: Option<String>,
    /// Media type plugin name, e.g. `mediagoblin.media_types.image`
    pub media_type: String,
    pub state: String,
    /// File role -> listy file path
    #[serde(default)]
    pub media_files: BTreeMap<String, Vec<String>>,
    pub created_at: Option<Datetime>,
}

/// Payload for creating a media entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntryCreate {
    pub uploader: RecordId,
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub description_html: String,
    pub license: Option<String>,
    pub media_type: String,
    pub state: MediaState,
    pub media_files: BTreeMap<String, Vec<String>>,
}

impl TryFrom<MediaEntryRecord> for MediaEntry {
    type Error = anyhow::Error;

    fn try_from(record: MediaEntryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record_key(&record.id),
            uploader_id: record_key(&record.uploader),
            title: record.title,
            slug: record.slug,
            description: record.description,
            description_html: record.description_html,
            license: record.license,
            media_type: record.media_type,
            state: record.state.parse()?,
            media_files: record
                .media_files
                .into_iter()
                .map(|(role, path)| (FileRole::new(role), path))
                .collect(),
            created: to_chrono(record.created_at)
                .ok_or_else(|| anyhow!("media entry {} has no creation time", record.id))?,
        })
    }
}

/// Persisted access token for the `access_token` strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    /// Database identifier
    pub id: RecordId,
    /// SHA-256 hash of the full token (raw tokens are never stored)
    pub token_hash: TokenHash,
    /// First part of the token for display/identification (e.g., "mg_abc12345")
    pub token_prefix: TokenPrefix,
    /// User the token authenticates as
    pub user_id: RecordId,
    /// Human-readable name for this token
    pub name: Option<String>,
    /// Whether the token is active (can be revoked)
    pub is_active: bool,
    /// Optional expiration time
    pub expires_at: Option<Datetime>,
    pub created_at: Option<Datetime>,
    /// Last time the token was used for authentication
    pub last_used_at: Option<Datetime>,
}

/// Payload for creating a new access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenCreate {
    pub token_hash: TokenHash,
    pub token_prefix: TokenPrefix,
    pub user_id: RecordId,
    pub name: Option<String>,
    pub expires_at: Option<Datetime>,
}
