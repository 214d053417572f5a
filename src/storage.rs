//! Public file storage, as far as the API needs it: turning a stored file's
//! listy path into the URL clients fetch it from.

use std::fmt;

use url::Url;

/// A stored file path is kept as its list of segments.
pub type ListyPath = [String];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A path segment is empty, `.`/`..`, or contains a separator.
    InvalidFilepath(String),
    /// The backend could not build a URL for the path.
    InvalidUrl(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilepath(p) => write!(f, "Invalid file path: {}", p),
            Self::InvalidUrl(msg) => write!(f, "Invalid file URL: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Reject segments that could escape the media directory.
fn clean_listy_path(path: &ListyPath) -> Result<(), StorageError> {
    if path.is_empty() {
        return Err(StorageError::InvalidFilepath(String::new()));
    }

    for segment in path {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains('/')
            || segment.contains('\\')
        {
            return Err(StorageError::InvalidFilepath(path.join("/")));
        }
    }

    Ok(())
}

/// Append `path` to `url`, percent-encoding each segment so `?`, `#` and `%`
/// stay part of the file name.
fn extend_path(url: &mut Url, path: &ListyPath) -> Result<(), StorageError> {
    url.path_segments_mut()
        .map_err(|_| StorageError::InvalidUrl("base URL cannot take path segments".to_string()))?
        .pop_if_empty()
        .extend(path);
    Ok(())
}

/// Files served by this site under a path such as `/mgoblin_media/`.
///
/// URLs it produces are relative to the site, never qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicFileStorage {
    base_url: String,
}

impl BasicFileStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn file_url(&self, path: &ListyPath) -> Result<String, StorageError> {
        clean_listy_path(path)?;

        // Only the path of this placeholder is returned.
        let mut url = Url::parse("http://localhost/")
            .map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        url.set_path(&self.base_url);
        extend_path(&mut url, path)?;
        Ok(url.path().to_string())
    }
}

/// Files served from an absolute base URL (object store, CDN).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileStorage {
    base_url: Url,
}

impl RemoteFileStorage {
    pub fn new(base_url: Url) -> Result<Self, StorageError> {
        if base_url.cannot_be_a_base() {
            return Err(StorageError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn file_url(&self, path: &ListyPath) -> Result<String, StorageError> {
        clean_listy_path(path)?;

        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        extend_path(&mut url, path)?;
        Ok(url.to_string())
    }
}

/// The configured public store. Exactly one backend is active per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicStore {
    Basic(BasicFileStorage),
    Remote(RemoteFileStorage),
}

impl PublicStore {
    pub fn basic(base_url: impl Into<String>) -> Self {
        Self::Basic(BasicFileStorage::new(base_url))
    }

    pub fn remote(base_url: Url) -> anyhow::Result<Self> {
        Ok(Self::Remote(RemoteFileStorage::new(base_url)?))
    }

    /// Whether `file_url` already yields absolute URLs.
    pub fn provides_qualified_urls(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn file_url(&self, path: &ListyPath) -> Result<String, StorageError> {
        match self {
            Self::Basic(store) => store.file_url(path),
            Self::Remote(store) => store.file_url(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_basic_file_url_is_relative() {
        let store = BasicFileStorage::new("/mgoblin_media");
        assert_eq!(store.base_url(), "/mgoblin_media/");

        let url = store
            .file_url(&path(&["media_entries", "1", "orig.jpg"]))
            .unwrap();
        assert_eq!(url, "/mgoblin_media/media_entries/1/orig.jpg");
    }

    #[test]
    fn test_remote_file_url_is_absolute() {
        let store = RemoteFileStorage::new(Url::parse("https://cdn.example.org/media").unwrap())
            .unwrap();

        let url = store.file_url(&path(&["media", "1", "orig.jpg"])).unwrap();
        assert_eq!(url, "https://cdn.example.org/media/media/1/orig.jpg");
    }

    #[test]
    fn test_rejects_traversal() {
        let store = BasicFileStorage::new("/media/");
        assert!(matches!(
            store.file_url(&path(&["..", "etc", "passwd"])),
            Err(StorageError::InvalidFilepath(_))
        ));
        assert!(store.file_url(&path(&["a/b"])).is_err());
        assert!(store.file_url(&path(&[])).is_err());
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        let basic = BasicFileStorage::new("/mgoblin_media/");
        assert_eq!(
            basic.file_url(&path(&["media", "a?b#c.jpg"])).unwrap(),
            "/mgoblin_media/media/a%3Fb%23c.jpg"
        );
        assert_eq!(
            basic.file_url(&path(&["media", "100%.png"])).unwrap(),
            "/mgoblin_media/media/100%25.png"
        );

        let remote =
            RemoteFileStorage::new(Url::parse("https://cdn.example.org/media/?v=1").unwrap())
                .unwrap();
        let url = Url::parse(&remote.file_url(&path(&["media", "a?b#c.jpg"])).unwrap()).unwrap();
        assert_eq!(url.path(), "/media/media/a%3Fb%23c.jpg");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_public_store_qualification() {
        assert!(!PublicStore::basic("/media/").provides_qualified_urls());

        let remote = PublicStore::remote(Url::parse("https://cdn.example.org/").unwrap()).unwrap();
        assert!(remote.provides_qualified_urls());
    }

    #[test]
    fn test_remote_rejects_non_base_url() {
        let result = RemoteFileStorage::new(Url::parse("mailto:media@example.org").unwrap());
        assert!(result.is_err());
    }
}
