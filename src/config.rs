use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Address the query service listens on when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Environment variable that overrides `base_url` from the config file
pub const BASE_URL_ENV: &str = "RAGCHAT_BASE_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the query service
    pub base_url: String,

    /// Fixed session id; a fresh one is generated per run when unset
    pub session_id: Option<String>,

    /// Whole-request timeout. Transport defaults apply when unset.
    pub request_timeout_secs: Option<u64>,

    /// UI preferences
    pub ui: UiConfig,

    /// Ragchat home directory
    #[serde(skip)]
    pub ragchat_home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Render the retrieved facts under each turn
    pub show_facts: bool,
    /// Redraw interval of the terminal UI
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_facts: true,
            tick_rate_ms: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_id: None,
            request_timeout_secs: None,
            ui: UiConfig::default(),
            ragchat_home: home.join(".ragchat"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.ragchat/config.toml`, or from `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_home = Config::default().ragchat_home;
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_home.join("config.toml"));

        let mut config = Self::load_from(&config_path)?;
        config.ragchat_home = default_home;

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        Ok(config)
    }

    /// Read a config file; a missing file yields defaults
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Apply command-line overrides on top of file and environment values
    pub fn with_overrides(mut self, base_url: Option<String>, session_id: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if session_id.is_some() {
            self.session_id = session_id;
        }
        self
    }

    /// Base url without a trailing slash
    pub fn service_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.ragchat_home.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.session_id.is_none());
        assert!(config.request_timeout().is_none());
        assert!(config.ui.show_facts);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"http://rag.internal:8080/\"\nrequest_timeout_secs = 30\n\n[ui]\nshow_facts = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.service_url(), "http://rag.internal:8080");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.ui.show_facts);
        assert_eq!(config.ui.tick_rate_ms, 100);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = Config::default()
            .with_overrides(Some("http://other:9000".into()), Some("fixed".into()));
        assert_eq!(config.base_url, "http://other:9000");
        assert_eq!(config.session_id.as_deref(), Some("fixed"));

        let untouched = Config::default().with_overrides(None, None);
        assert_eq!(untouched.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.session_id = Some("demo-session".into());
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.session_id.as_deref(), Some("demo-session"));
        assert_eq!(back.base_url, config.base_url);
    }
}
