//! Qualified URL generation for the site's public pages.

use anyhow::{Result, anyhow};
use url::Url;

/// Builds absolute URLs under the configured site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlGen {
    root: Url,
}

impl UrlGen {
    pub fn new(root: Url) -> Result<Self> {
        if root.cannot_be_a_base() {
            return Err(anyhow!("site root {} cannot be used as a base URL", root));
        }
        Ok(Self { root })
    }

    /// The site index page.
    pub fn index(&self) -> &Url {
        &self.root
    }

    /// `{root}u/{username}/`
    pub fn user_home(&self, username: &str) -> Result<Url> {
        self.under_root(&["u", username])
    }

    /// `{root}u/{username}/m/{media}/` where `media` is a slug or an id.
    pub fn media_home(&self, username: &str, media: &str) -> Result<Url> {
        self.under_root(&["u", username, "m", media])
    }

    fn under_root(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("site root {} cannot be used as a base URL", self.root))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urlgen(root: &str) -> UrlGen {
        UrlGen::new(Url::parse(root).unwrap()).unwrap()
    }

    #[test]
    fn test_index_is_root() {
        let urls = urlgen("https://media.example.org/");
        assert_eq!(urls.index().as_str(), "https://media.example.org/");
    }

    #[test]
    fn test_user_home() {
        let urls = urlgen("https://media.example.org/");
        assert_eq!(
            urls.user_home("alice").unwrap().as_str(),
            "https://media.example.org/u/alice/"
        );
    }

    #[test]
    fn test_media_home_under_prefixed_root() {
        let urls = urlgen("https://example.org/mg/");
        assert_eq!(
            urls.media_home("alice", "sunset").unwrap().as_str(),
            "https://example.org/mg/u/alice/m/sunset/"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let urls = urlgen("https://media.example.org/");
        assert_eq!(
            urls.media_home("alice", "a b/c").unwrap().as_str(),
            "https://media.example.org/u/alice/m/a%20b%2Fc/"
        );
    }
}
