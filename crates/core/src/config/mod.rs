//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Routing and lifecycle settings for one release of the app shell.
///
/// Immutable once the router is built; a new release bumps `version_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Name of the bucket owned by this release.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Paths fetched and stored at install time, in order.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Requests whose path contains this are API calls.
    #[serde(default = "default_api_path_prefix")]
    pub api_path_prefix: String,

    /// Requests whose path starts with this are map assets (network-first).
    #[serde(default = "default_map_asset_path_prefix")]
    pub map_asset_path_prefix: String,
}

fn default_version_tag() -> String {
    "app-cache-v3".into()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/main",
        "/lookup",
        "/pinpoint",
        "/quiz",
        "/static/lookup.css",
        "/static/lookup.js",
        "/static/pinpoint.css",
        "/static/pinpoint.js",
        "/static/quiz.css",
        "/static/quiz.js",
        "/static/manifest.webmanifest",
        "/static/icons/icon-192.png",
        "/static/icons/icon-512.png",
        "/static/icons/icon.svg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_path_prefix() -> String {
    "/api/".into()
}

fn default_map_asset_path_prefix() -> String {
    "/static/maps/".into()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            version_tag: default_version_tag(),
            manifest: default_manifest(),
            api_path_prefix: default_api_path_prefix(),
            map_asset_path_prefix: default_map_asset_path_prefix(),
        }
    }
}

impl RouterConfig {
    /// Same defaults with a different tag and manifest.
    pub fn with_release(version_tag: impl Into<String>, manifest: &[&str]) -> Self {
        Self {
            version_tag: version_tag.into(),
            manifest: manifest.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*, nested keys split on `__`)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the app shell is served from. Only same-origin requests are intercepted.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Release settings (SHELLCACHE_ROUTER__VERSION_TAG, ...).
    #[serde(default)]
    pub router: RouterConfig,
}

fn default_origin() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            router: RouterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme {other}") }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        ))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://127.0.0.1:5000");
        assert_eq!(config.db_path, PathBuf::from("./shellcache.sqlite"));
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.router, RouterConfig::default());
    }

    #[test]
    fn test_default_router_config() {
        let router = RouterConfig::default();
        assert_eq!(router.version_tag, "app-cache-v3");
        assert_eq!(router.api_path_prefix, "/api/");
        assert_eq!(router.map_asset_path_prefix, "/static/maps/");
        assert_eq!(router.manifest.first().map(String::as_str), Some("/"));
        assert!(router.manifest.contains(&"/quiz".to_string()));
        assert_eq!(router.manifest.len(), 15);
    }

    #[test]
    fn test_with_release() {
        let router = RouterConfig::with_release("v-next", &["/", "/quiz", "/stats"]);
        assert_eq!(router.version_tag, "v-next");
        assert_eq!(router.manifest, vec!["/", "/quiz", "/stats"]);
        assert_eq!(router.api_path_prefix, "/api/");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        assert_eq!(config.origin_url().unwrap().as_str(), "http://127.0.0.1:5000/");

        let config = AppConfig { origin: "ftp://files.test".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_extract_nested_toml() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            origin = "https://codes.test"

            [router]
            version_tag = "app-cache-v5"
            manifest = ["/", "/stats"]
            "#,
        ));

        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.origin, "https://codes.test");
        assert_eq!(config.router.version_tag, "app-cache-v5");
        assert_eq!(config.router.manifest, vec!["/", "/stats"]);
        assert_eq!(config.router.api_path_prefix, "/api/");
    }

    #[test]
    fn test_extract_rejects_invalid() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("timeout_ms = 5"));
        assert!(matches!(AppConfig::extract(figment), Err(ConfigError::Invalid { .. })));
    }
}
