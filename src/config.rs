//! Configuration file parser for ~/.config/confide/config.toml.
//!
//! The file is optional; a missing or empty file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use crate::feed::PollSchedule;
use crate::page::{PageLayout, DEFAULT_TIME_FORMAT};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "CONFIDE_BASE_URL";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level client configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the board is served, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,

    /// Posts refresh period in seconds. 0 = never poll.
    pub posts_poll_secs: u64,

    /// Stats refresh period in seconds. 0 = never poll.
    pub stats_poll_secs: u64,

    /// Trending refresh period in seconds. 0 = never poll.
    pub trending_poll_secs: u64,

    /// Per-request timeout in seconds. 0 = wait for the transport.
    pub request_timeout_secs: u64,

    /// strftime layout for post timestamps.
    pub timestamp_format: String,

    /// Categories offered as filter buttons, besides "all".
    pub categories: Vec<String>,

    /// Whether the page has a stats panel.
    pub show_stats: bool,

    /// Whether the page has a trending panel.
    pub show_trending: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            posts_poll_secs: 30,
            stats_poll_secs: 60,
            trending_poll_secs: 60,
            request_timeout_secs: 0,
            timestamp_format: DEFAULT_TIME_FORMAT.to_string(),
            categories: Vec::new(),
            show_stats: true,
            show_trending: true,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "base_url",
        "posts_poll_secs",
        "stats_poll_secs",
        "trending_poll_secs",
        "request_timeout_secs",
        "timestamp_format",
        "categories",
        "show_stats",
        "show_trending",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), base_url = %config.base_url, "Loaded configuration");
        Ok(config)
    }

    /// Applies `CONFIDE_BASE_URL` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.override_base_url(std::env::var(BASE_URL_ENV).ok());
        self
    }

    fn override_base_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(base_url = %url, "Base URL overridden from environment");
            self.base_url = url;
        }
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule {
            posts: Duration::from_secs(self.posts_poll_secs),
            stats: Duration::from_secs(self.stats_poll_secs),
            trending: Duration::from_secs(self.trending_poll_secs),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn page_layout(&self) -> PageLayout {
        PageLayout {
            posts: true,
            stats: self.show_stats,
            trending: self.show_trending,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("confide_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.poll_schedule(), PollSchedule::default());
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.page_layout(), PageLayout::default());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/confide_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.posts_poll_secs, 30);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let path = write_config("empty", "   \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.stats_poll_secs, 60);
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "base_url = \"https://board.example.com\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "https://board.example.com");
        assert_eq!(config.trending_poll_secs, 60);
        assert!(config.show_stats);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
base_url = "http://localhost:8080/board"
posts_poll_secs = 10
stats_poll_secs = 0
trending_poll_secs = 120
request_timeout_secs = 15
timestamp_format = "%Y-%m-%d %H:%M"
categories = ["confession", "crush", "rant"]
show_stats = false
show_trending = true
"#;
        let path = write_config("full", content);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/board");
        assert_eq!(
            config.poll_schedule(),
            PollSchedule {
                posts: Duration::from_secs(10),
                stats: Duration::ZERO,
                trending: Duration::from_secs(120),
            }
        );
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.timestamp_format, "%Y-%m-%d %H:%M");
        assert_eq!(config.categories, vec!["confession", "crush", "rant"]);
        assert!(!config.page_layout().stats);
        assert!(config.page_layout().trending);
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "posts_poll_secs = 5\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.posts_poll_secs, 5);
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "posts_poll_secs = \"soon\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_base_url_override() {
        let mut config = Config::default();
        config.override_base_url(Some("https://other.example.com".into()));
        assert_eq!(config.base_url, "https://other.example.com");

        config.override_base_url(Some("  ".into()));
        assert_eq!(config.base_url, "https://other.example.com");

        config.override_base_url(None);
        assert_eq!(config.base_url, "https://other.example.com");
    }
}
