//! Configuration management for the console.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default analytics API base URL.
pub const DEFAULT_API_URL: &str = "https://api-aiqa-backend.dev.supportninja.com";

/// Default authentication service base URL (`/login` and `/logout` live under it).
pub const DEFAULT_AUTH_URL: &str = "https://api-rbac.dev.supportninja.com/rbac";

/// Application identifier sent with every auth service call.
pub const DEFAULT_APPLICATION_ID: &str = "digital_qa";

/// Default upper bound for a single refresh call.
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_LOG_LEVEL: &str = "QA_CONSOLE_LOG_LEVEL";
const ENV_API_URL: &str = "QA_CONSOLE_API_URL";
const ENV_AUTH_URL: &str = "QA_CONSOLE_AUTH_URL";

/// Main console configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Analytics API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Authentication service base URL.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Application identifier presented to the auth service.
    #[serde(default = "default_application_id")]
    pub application_id: String,
    /// Seconds before an outstanding refresh call is abandoned.
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,
    /// Roles that grant access to the console at login.
    #[serde(default = "default_allowed_roles")]
    pub allowed_roles: Vec<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_application_id() -> String {
    DEFAULT_APPLICATION_ID.to_string()
}

fn default_refresh_timeout_secs() -> u64 {
    DEFAULT_REFRESH_TIMEOUT_SECS
}

fn default_allowed_roles() -> Vec<String> {
    vec![
        "digital_qa.all.viewer".to_string(),
        "digital_qa.all.admin".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_url: default_api_url(),
            auth_url: default_auth_url(),
            application_id: default_application_id(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            allowed_roles: default_allowed_roles(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(url) = non_empty(ENV_AUTH_URL) {
            self.auth_url = url;
        }
    }

    /// Reject values the session layer cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_url()?;
        self.auth_url()?;
        if self.application_id.trim().is_empty() {
            return Err(CoreError::Config("application_id must not be empty".to_string()));
        }
        if self.refresh_timeout_secs == 0 {
            return Err(CoreError::Config(
                "refresh_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_url).map_err(CoreError::from)
    }

    /// Get the auth service base URL as a parsed URL.
    pub fn auth_url(&self) -> CoreResult<Url> {
        Url::parse(&self.auth_url).map_err(CoreError::from)
    }

    /// Refresh call timeout as a `Duration`.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.application_id, "digital_qa");
        assert_eq!(config.refresh_timeout(), Duration::from_secs(30));
        assert_eq!(config.allowed_roles.len(), 2);
    }

    #[test]
    fn test_config_load_from_file_partial() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(&config_path, r#"{ "log_level": "debug", "refresh_timeout_secs": 5 }"#)
            .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.refresh_timeout_secs, 5);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.application_id = "digital_qa_staging".to_string();
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.application_id, "digital_qa_staging");
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.application_id, DEFAULT_APPLICATION_ID);
    }

    #[test]
    fn test_overrides_replace_urls_and_level() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("QA_CONSOLE_LOG_LEVEL", "trace"),
            ("QA_CONSOLE_API_URL", "http://localhost:8080"),
            ("QA_CONSOLE_AUTH_URL", "  "),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, "trace");
        assert_eq!(config.api_url, "http://localhost:8080");
        // Blank values are ignored.
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.auth_url = "not a valid url".to_string();
        assert!(matches!(config.validate(), Err(CoreError::InvalidUrl(_))));

        let mut config = Config::default();
        config.refresh_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = Config::default();
        config.application_id = String::new();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_url_accessors() {
        let config = Config::default();
        assert_eq!(config.api_url().unwrap().scheme(), "https");
        assert_eq!(config.auth_url().unwrap().path(), "/rbac");
    }
}
