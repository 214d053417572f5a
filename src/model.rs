//! Domain views of stored records, independent of the database driver.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FileRole, Username};

/// Processing state of a media entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaState {
    Unprocessed,
    Processing,
    Processed,
    Failed,
}

impl MediaState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unprocessed => "unprocessed",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for MediaState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unprocessed" => Ok(Self::Unprocessed),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            other => Err(anyhow::anyhow!("unknown media state `{}`", other)),
        }
    }
}

/// A registered user as the API sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: Username,
    pub email: Option<String>,
    pub bio: String,
    pub bio_html: String,
    pub is_active: bool,
}

/// A media entry as the API sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub id: String,
    pub uploader_id: String,
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub description_html: String,
    pub license: Option<String>,
    pub media_type: String,
    pub state: MediaState,
    /// File role -> listy path of the stored file.
    pub media_files: BTreeMap<FileRole, Vec<String>>,
    pub created: DateTime<Utc>,
}

impl MediaEntry {
    /// Slug if the entry has one, otherwise its id.
    pub fn slug_or_id(&self) -> &str {
        match self.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slug,
            _ => &self.id,
        }
    }
}
