//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::{AppConfig, RouterConfig};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - any `router` field fails [`RouterConfig::validate`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        self.router.validate()
    }
}

impl RouterConfig {
    /// Validate release settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty version tag and
    /// `ConfigError::Invalid` for malformed tags, manifest paths or prefixes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version_tag.is_empty() {
            return Err(ConfigError::Missing {
                field: "router.version_tag".into(),
                hint: "Set SHELLCACHE_ROUTER__VERSION_TAG, e.g. app-cache-v4".into(),
            });
        }
        if self.version_tag.chars().any(char::is_whitespace) {
            return Err(invalid("router.version_tag", "must not contain whitespace"));
        }

        let mut seen = HashSet::new();
        for path in &self.manifest {
            if !path.starts_with('/') {
                return Err(invalid("router.manifest", format!("{path:?} must start with '/'")));
            }
            if !seen.insert(path.as_str()) {
                return Err(invalid("router.manifest", format!("{path:?} listed twice")));
            }
        }

        for (field, prefix) in [
            ("router.api_path_prefix", &self.api_path_prefix),
            ("router.map_asset_path_prefix", &self.map_asset_path_prefix),
        ] {
            if !prefix.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if self.manifest.is_empty() {
            tracing::warn!(
                version_tag = %self.version_tag,
                "router.manifest is empty; install will create an empty bucket"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_exceeds_limit() {
        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }; // 51MB
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 100, max_bytes: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_missing_version_tag() {
        let router = RouterConfig { version_tag: String::new(), ..Default::default() };
        assert!(matches!(router.validate(), Err(ConfigError::Missing { .. })));

        let router = RouterConfig { version_tag: "app cache".into(), ..Default::default() };
        assert!(matches!(router.validate(), Err(ConfigError::Invalid { field, .. }) if field == "router.version_tag"));
    }

    #[test]
    fn test_validate_manifest_paths() {
        let router = RouterConfig::with_release("v1", &["/", "quiz"]);
        assert!(matches!(router.validate(), Err(ConfigError::Invalid { field, .. }) if field == "router.manifest"));

        let router = RouterConfig::with_release("v1", &["/", "/quiz", "/"]);
        assert!(matches!(router.validate(), Err(ConfigError::Invalid { field, .. }) if field == "router.manifest"));

        let router = RouterConfig::with_release("v1", &[]);
        assert!(router.validate().is_ok());
    }

    #[test]
    fn test_validate_prefixes() {
        let router = RouterConfig { api_path_prefix: "api/".into(), ..Default::default() };
        assert!(
            matches!(router.validate(), Err(ConfigError::Invalid { field, .. }) if field == "router.api_path_prefix")
        );

        let router = RouterConfig { map_asset_path_prefix: String::new(), ..Default::default() };
        assert!(matches!(
            router.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "router.map_asset_path_prefix"
        ));
    }

    #[test]
    fn test_validate_nested_router_error_surfaces() {
        let config = AppConfig { router: RouterConfig::with_release("v1", &["relative"]), ..Default::default() };
        assert!(config.validate().is_err());
    }
}
