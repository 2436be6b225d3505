//! Configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Main configuration, read from `config.toml` in [`TatvaConfig::config_dir`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TatvaConfig {
    /// Hosted catalog connection
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Index cache and matcher behavior
    #[serde(default)]
    pub search: SearchBehaviorConfig,

    /// Landing pages used when deriving navigation routes
    #[serde(default)]
    pub routes: RoutesConfig,
}

/// Hosted catalog connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Anonymous (publishable) API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Rows requested per page; hosted PostgREST caps responses at 1000
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
        }
    }
}

impl CatalogConfig {
    /// Base URL without a trailing slash. Only http(s) URLs are accepted.
    pub fn base_url(&self) -> CoreResult<String> {
        let url = self.url.as_deref().map(str::trim).unwrap_or_default();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Message(
                "Catalog URL is missing or is not an http(s) URL.".into(),
            ));
        }
        Ok(url.trim_end_matches('/').to_string())
    }

    pub fn get_api_key(&self) -> CoreResult<String> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(CoreError::Message("Catalog API key is missing.".into())),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    1000
}

/// Index cache and matcher behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBehaviorConfig {
    /// Age below which a built index is served without rebuilding
    #[serde(default = "default_fresh_secs")]
    pub fresh_secs: u64,

    /// Age after which a built index is no longer served at all
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,

    /// Upper bound on one catalog fetch during a build
    #[serde(default = "default_build_timeout_secs")]
    pub build_timeout_secs: u64,

    /// Wait after a failed build before background refreshes retry
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// Chapters shown before collapsing the rest into "+N more"
    #[serde(default = "default_chapter_display_limit")]
    pub chapter_display_limit: usize,

    /// Display name for chapters with no localized name; `{n}` is the chapter number
    #[serde(default = "default_chapter_placeholder")]
    pub chapter_placeholder: String,
}

impl Default for SearchBehaviorConfig {
    fn default() -> Self {
        Self {
            fresh_secs: default_fresh_secs(),
            stale_secs: default_stale_secs(),
            build_timeout_secs: default_build_timeout_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
            chapter_display_limit: default_chapter_display_limit(),
            chapter_placeholder: default_chapter_placeholder(),
        }
    }
}

impl SearchBehaviorConfig {
    pub fn fresh_for(&self) -> Duration {
        Duration::from_secs(self.fresh_secs)
    }

    /// Never shorter than the fresh window.
    pub fn stale_for(&self) -> Duration {
        Duration::from_secs(self.stale_secs.max(self.fresh_secs))
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

fn default_fresh_secs() -> u64 {
    30 * 60
}

fn default_stale_secs() -> u64 {
    60 * 60
}

fn default_build_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_secs() -> u64 {
    60
}

fn default_chapter_display_limit() -> usize {
    20
}

fn default_chapter_placeholder() -> String {
    "Chapter {n}".to_string()
}

/// Landing pages used when deriving navigation routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Route for books without a landing page
    #[serde(default = "default_fallback_route")]
    pub fallback: String,

    /// Book code -> landing page
    #[serde(default = "default_book_pages")]
    pub book_pages: BTreeMap<String, String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback_route(),
            book_pages: default_book_pages(),
        }
    }
}

impl RoutesConfig {
    pub fn book_page(&self, code: &str) -> &str {
        self.book_pages
            .get(code)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

fn default_fallback_route() -> String {
    "/contents".to_string()
}

fn default_book_pages() -> BTreeMap<String, String> {
    [
        ("rm", "/ramayana"),
        ("mb", "/mahabharata"),
        ("bg", "/bhagavad-gita"),
        ("rv", "/rigveda"),
        ("sbp", "/srimad-bhagavatam"),
        ("ms", "/manu-smriti"),
        ("mp", "/markandeya-purana"),
        ("dm", "/devi-mahatmyam"),
        ("ph", "/parashara"),
        ("ro", "/ramopakyana"),
        ("yv", "/yoga-vasishtha"),
    ]
    .into_iter()
    .map(|(code, page)| (code.to_string(), page.to_string()))
    .collect()
}

impl TatvaConfig {
    /// Load configuration from file and environment.
    /// Priority: environment variables > config.toml > defaults
    pub fn load() -> CoreResult<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file, without environment overrides.
    pub fn load_from(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides looked up by variable name. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .find(|value| !value.is_empty())
        };

        if let Some(url) = first(&["TATVA_CATALOG_URL", "SUPABASE_URL"]) {
            self.catalog.url = Some(url);
        }
        if let Some(key) = first(&["TATVA_CATALOG_KEY", "SUPABASE_ANON_KEY"]) {
            self.catalog.api_key = Some(key);
        }
    }

    /// Base config directory
    pub fn config_dir() -> PathBuf {
        if let Ok(root) = std::env::var("TATVA_ROOT") {
            return PathBuf::from(root);
        }

        dirs::home_dir()
            .map(|h| h.join(".tatva"))
            .unwrap_or_else(|| PathBuf::from(".tatva"))
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
