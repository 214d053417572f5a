use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use url::Url;

use crate::storage::PublicStore;
use crate::types::StrategyName;

pub const DEFAULT_SITE_ROOT: &str = "http://localhost:6543/";
pub const DEFAULT_MEDIA_BASE_URL: &str = "/mgoblin_media/";
pub const DEFAULT_ENTRIES_LIMIT: u32 = 10;
pub const MAX_ENTRIES_LIMIT: u32 = 100;

/// Strategies registered when the config file does not name any.
pub const DEFAULT_STRATEGIES: [&str; 2] = ["http_basic", "access_token"];

/// On-disk shape of `media-api.json`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub site_root: Option<String>,
    #[serde(default)]
    pub public_store: Option<PublicStoreFile>,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub api: ApiSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicStoreFile {
    /// Local files served under a site-relative path.
    Basic { base_url: String },
    /// Files served from an absolute URL (CDN, object store).
    Remote { base_url: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthSection {
    /// Built-in strategies to register, in registration order.
    #[serde(default)]
    pub strategies: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub default_entries_limit: Option<u32>,
    #[serde(default)]
    pub max_entries_limit: Option<u32>,
}

/// Validated application configuration.
///
/// Passed explicitly into the router state; nothing reads site-wide settings
/// from globals.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub site_root: Url,
    pub public_store: PublicStore,
    pub strategies: Vec<StrategyName>,
    pub default_entries_limit: u32,
    pub max_entries_limit: u32,
}

impl AppConfig {
    pub fn from_file(cfg: ConfigFile) -> anyhow::Result<Self> {
        let site_root = parse_site_root(cfg.site_root.as_deref().unwrap_or(DEFAULT_SITE_ROOT))?;

        let public_store = match cfg.public_store {
            None => PublicStore::basic(DEFAULT_MEDIA_BASE_URL),
            Some(PublicStoreFile::Basic { base_url }) => PublicStore::basic(base_url),
            Some(PublicStoreFile::Remote { base_url }) => {
                let base_url = Url::parse(&base_url).map_err(|e| {
                    anyhow::anyhow!("public_store.base_url `{}` is not an absolute URL: {}", base_url, e)
                })?;
                PublicStore::remote(base_url)?
            }
        };

        let strategies = cfg
            .auth
            .strategies
            .unwrap_or_else(|| DEFAULT_STRATEGIES.iter().map(|s| s.to_string()).collect())
            .into_iter()
            .map(|s| StrategyName::new(s.trim()))
            .collect::<Vec<_>>();

        if strategies.is_empty() {
            tracing::warn!(
                "No authentication strategies configured - all protected requests will be rejected"
            );
        }

        let default_entries_limit = cfg.api.default_entries_limit.unwrap_or(DEFAULT_ENTRIES_LIMIT);
        let max_entries_limit = cfg.api.max_entries_limit.unwrap_or(MAX_ENTRIES_LIMIT);

        if max_entries_limit == 0 {
            return Err(anyhow::anyhow!("api.max_entries_limit must be greater than 0"));
        }
        if default_entries_limit == 0 || default_entries_limit > max_entries_limit {
            return Err(anyhow::anyhow!(
                "api.default_entries_limit must be between 1 and {}",
                max_entries_limit
            ));
        }

        Ok(Self {
            site_root,
            public_store,
            strategies,
            default_entries_limit,
            max_entries_limit,
        })
    }
}

/// Parse the site root, requiring an absolute http(s) URL with a trailing
/// slash on its path so relative joins stay under it.
fn parse_site_root(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| anyhow::anyhow!("site_root `{}` is not an absolute URL: {}", raw, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow::anyhow!("site_root `{}` must use http or https", raw));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Locate the config file. `None` means run on defaults.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p);
    }

    if let Ok(p) = env::var("MEDIA_API_CONFIG") {
        return Some(PathBuf::from(p));
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let candidate = PathBuf::from(xdg).join("media-api").join("media-api.json");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let candidate = PathBuf::from("media-api.json");
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

/// Replace `${NAME}` references using `lookup`. Unknown names stay verbatim.
pub fn expand_env_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Some(val) = lookup(&name) {
                out.push_str(&val);
            } else {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
        } else {
            out.push(ch);
        }
    }

    out
}

fn expand_env_vars(input: &str) -> String {
    expand_env_vars_with(input, |name| env::var(name).ok())
}

fn expand_file(cfg: ConfigFile) -> ConfigFile {
    let mut cfg = cfg;

    if let Some(root) = cfg.site_root.as_mut() {
        *root = expand_env_vars(root);
    }
    if let Some(store) = cfg.public_store.as_mut() {
        match store {
            PublicStoreFile::Basic { base_url } | PublicStoreFile::Remote { base_url } => {
                *base_url = expand_env_vars(base_url);
            }
        }
    }

    cfg
}

pub fn parse_config(raw: &str) -> anyhow::Result<AppConfig> {
    let cfg: ConfigFile = serde_json::from_str(raw)?;
    AppConfig::from_file(expand_file(cfg))
}

pub fn load_app_config(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        tracing::info!("No config file found, using defaults");
        return AppConfig::from_file(ConfigFile::default());
    };

    tracing::info!("Loading config from {}", path.display());
    let raw = fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {}", path.display(), e))?;
    parse_config(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_file(ConfigFile::default()).unwrap();
        assert_eq!(config.site_root.as_str(), DEFAULT_SITE_ROOT);
        assert!(!config.public_store.provides_qualified_urls());
        assert_eq!(
            config.strategies,
            vec![StrategyName::new("http_basic"), StrategyName::new("access_token")]
        );
        assert_eq!(config.default_entries_limit, 10);
        assert_eq!(config.max_entries_limit, 100);
    }

    #[test]
    fn test_parse_remote_store() {
        let config = parse_config(
            r#"{
                "site_root": "https://media.example.org",
                "public_store": { "type": "remote", "base_url": "https://cdn.example.org/media/" },
                "auth": { "strategies": ["access_token"] },
                "api": { "default_entries_limit": 5, "max_entries_limit": 20 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.site_root.as_str(), "https://media.example.org/");
        assert!(config.public_store.provides_qualified_urls());
        assert_eq!(config.strategies, vec![StrategyName::new("access_token")]);
        assert_eq!(config.default_entries_limit, 5);
        assert_eq!(config.max_entries_limit, 20);
    }

    #[test]
    fn test_site_root_gets_trailing_slash() {
        let config = parse_config(r#"{ "site_root": "https://example.org/mg" }"#).unwrap();
        assert_eq!(config.site_root.as_str(), "https://example.org/mg/");
    }

    #[test]
    fn test_rejects_relative_site_root() {
        assert!(parse_config(r#"{ "site_root": "/relative" }"#).is_err());
        assert!(parse_config(r#"{ "site_root": "ftp://example.org/" }"#).is_err());
    }

    #[test]
    fn test_rejects_relative_remote_store() {
        let result = parse_config(
            r#"{ "public_store": { "type": "remote", "base_url": "/not/absolute/" } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_limits() {
        assert!(parse_config(r#"{ "api": { "max_entries_limit": 0 } }"#).is_err());
        assert!(
            parse_config(r#"{ "api": { "default_entries_limit": 50, "max_entries_limit": 10 } }"#)
                .is_err()
        );
    }

    #[test]
    fn test_expand_env_vars_with_lookup() {
        let lookup = |name: &str| match name {
            "HOST" => Some("media.example.org".to_string()),
            _ => None,
        };

        assert_eq!(
            expand_env_vars_with("https://${HOST}/", lookup),
            "https://media.example.org/"
        );
        assert_eq!(expand_env_vars_with("${MISSING}/x", lookup), "${MISSING}/x");
        assert_eq!(expand_env_vars_with("plain $text", lookup), "plain $text");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "public_store": {{ "type": "basic", "base_url": "/files/" }} }}"#
        )
        .unwrap();

        let config = load_app_config(Some(file.path().to_path_buf())).unwrap();
        assert!(!config.public_store.provides_qualified_urls());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = load_app_config(Some(PathBuf::from("/nonexistent/media-api.json")));
        assert!(result.is_err());
    }
}
