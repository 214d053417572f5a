// JSON views of media entries

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{MediaEntry, MediaState, User};
use crate::storage::PublicStore;
use crate::types::FileRole;
use crate::urlgen::UrlGen;

/// Wire form of a media entry. Field order is the JSON key order.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySerializable {
    pub user: String,
    pub user_id: String,
    pub user_bio: String,
    pub user_bio_html: String,
    pub user_permalink: String,
    pub id: String,
    pub created: String,
    pub title: String,
    pub license: Option<String>,
    pub description: String,
    pub description_html: String,
    pub media_type: String,
    pub state: MediaState,
    pub permalink: String,
    pub media_files: BTreeMap<FileRole, String>,
}

pub fn entry_serializable(
    entry: &MediaEntry,
    uploader: &User,
    urlgen: &UrlGen,
    store: &PublicStore,
) -> Result<EntrySerializable> {
    let username = uploader.username.as_str();

    Ok(EntrySerializable {
        user: username.to_string(),
        user_id: uploader.id.clone(),
        user_bio: uploader.bio.clone(),
        user_bio_html: uploader.bio_html.clone(),
        user_permalink: urlgen.user_home(username)?.to_string(),
        id: entry.id.clone(),
        created: entry.created.to_rfc3339(),
        title: entry.title.clone(),
        license: entry.license.clone(),
        description: entry.description.clone(),
        description_html: entry.description_html.clone(),
        media_type: entry.media_type.clone(),
        state: entry.state.clone(),
        permalink: urlgen.media_home(username, entry.slug_or_id())?.to_string(),
        media_files: media_file_urls(&entry.media_files, urlgen, store)?,
    })
}

/// Map each file role to the qualified URL of its file.
///
/// Backends that only produce site-relative URLs are resolved against the
/// site index.
pub fn media_file_urls(
    files: &BTreeMap<FileRole, Vec<String>>,
    urlgen: &UrlGen,
    store: &PublicStore,
) -> Result<BTreeMap<FileRole, String>> {
    files
        .iter()
        .map(|(role, path)| {
            let file_url = store.file_url(path)?;
            let url = if store.provides_qualified_urls() {
                file_url
            } else {
                urlgen
                    .index()
                    .join(&file_url)
                    .with_context(|| format!("cannot resolve {} against site root", file_url))?
                    .to_string()
            };
            Ok((role.clone(), url))
        })
        .collect()
}
