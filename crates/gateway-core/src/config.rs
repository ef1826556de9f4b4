//! Configuration for the session-approval gateway.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default request timeout and blocking-wait bound, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default metrics publish interval, in seconds.
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 600;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main gateway configuration.
///
/// The subsystem is administratively disabled whenever `base_url` or
/// `api_token` is empty; disabled operation synthesizes outcomes without
/// any network activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Remote authorization service base URL (empty disables the gateway).
    #[serde(default)]
    pub base_url: String,
    /// Bearer token for the remote service (empty disables the gateway).
    #[serde(default)]
    pub api_token: String,
    /// Galaxy this server instance belongs to.
    #[serde(default)]
    pub galaxy_id: u32,
    /// Treat a missing remote decision as ALLOW instead of TEMPFAIL.
    #[serde(default)]
    pub fail_open: bool,
    /// Make real calls but force every delivered result to ALLOW.
    #[serde(default)]
    pub dry_run: bool,
    /// Request timeout and blocking-call wait bound, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Completion worker pool size.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Metrics publish interval in seconds; 0 disables publishing.
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
    /// Retention window for unacknowledged durable events, in hours.
    #[serde(default = "default_wal_retention_hours")]
    pub wal_retention_hours: u64,
    /// Explicit streaming URL; when empty it is derived from `base_url`.
    #[serde(default)]
    pub stream_url: String,
    /// Directory holding the durable event store.
    #[serde(default = "default_wal_dir")]
    pub wal_dir: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_worker_threads() -> usize {
    4
}

fn default_metrics_interval_secs() -> u64 {
    DEFAULT_METRICS_INTERVAL_SECS
}

fn default_wal_retention_hours() -> u64 {
    6
}

fn default_wal_dir() -> String {
    "wal".to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            galaxy_id: 0,
            fail_open: false,
            dry_run: false,
            timeout_secs: default_timeout_secs(),
            worker_threads: default_worker_threads(),
            metrics_interval_secs: default_metrics_interval_secs(),
            wal_retention_hours: default_wal_retention_hours(),
            stream_url: String::new(),
            wal_dir: default_wal_dir(),
            log_level: default_log_level(),
        }
    }
}

impl GatewayConfig {
    /// Create a config from defaults plus environment overrides.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(url) = std::env::var("GATEWAY_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(token) = std::env::var("GATEWAY_API_TOKEN") {
            self.api_token = token;
        }
        if let Ok(level) = std::env::var("GATEWAY_LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Whether the gateway is configured for live operation.
    pub fn is_enabled(&self) -> bool {
        !self.base_url.is_empty() && !self.api_token.is_empty()
    }

    /// Parse and validate the base URL.
    pub fn base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.base_url).map_err(CoreError::from)
    }

    /// The raw token with any "Bearer " prefix stripped.
    ///
    /// Operators sometimes paste the full header value into the config;
    /// accept both forms.
    pub fn bearer_token(&self) -> &str {
        self.api_token
            .strip_prefix("Bearer ")
            .unwrap_or(&self.api_token)
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// WAL retention window as a Duration.
    pub fn wal_retention(&self) -> Duration {
        Duration::from_secs(self.wal_retention_hours * 3600)
    }

    /// Streaming URL: explicit override, or ws(s) derived from the base URL.
    ///
    /// Returns None when neither yields a usable URL (streaming disabled).
    pub fn derived_stream_url(&self) -> Option<String> {
        if !self.stream_url.is_empty() {
            return Some(self.stream_url.clone());
        }
        if self.base_url.is_empty() {
            return None;
        }

        let trimmed = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = trimmed.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return None;
        };

        Some(format!(
            "{}/v1/core3/stream?galaxy_id={}",
            ws_base, self.galaxy_id
        ))
    }

    /// Metrics interval with production clamping applied.
    ///
    /// 0 disables publishing. Release builds clamp everything else to
    /// [30, 3600] seconds; debug builds take the value as-is so tests can
    /// run with short intervals.
    pub fn clamped_metrics_interval_secs(&self) -> u64 {
        let interval = self.metrics_interval_secs;
        if interval == 0 || cfg!(debug_assertions) {
            return interval;
        }
        interval.clamp(30, 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_disabled() {
        let config = GatewayConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_enabled_requires_url_and_token() {
        let mut config = GatewayConfig::default();
        config.base_url = "https://api.example.com".to_string();
        assert!(!config.is_enabled());

        config.api_token = "secret".to_string();
        assert!(config.is_enabled());
    }

    #[test]
    fn test_bearer_prefix_stripped() {
        let mut config = GatewayConfig::default();
        config.api_token = "Bearer abc123".to_string();
        assert_eq!(config.bearer_token(), "abc123");

        config.api_token = "abc123".to_string();
        assert_eq!(config.bearer_token(), "abc123");
    }

    #[test]
    fn test_stream_url_derivation() {
        let mut config = GatewayConfig::default();
        config.base_url = "https://api.example.com/".to_string();
        config.galaxy_id = 2;
        assert_eq!(
            config.derived_stream_url().unwrap(),
            "wss://api.example.com/v1/core3/stream?galaxy_id=2"
        );

        config.base_url = "http://localhost:8080".to_string();
        assert_eq!(
            config.derived_stream_url().unwrap(),
            "ws://localhost:8080/v1/core3/stream?galaxy_id=2"
        );
    }

    #[test]
    fn test_stream_url_override_wins() {
        let mut config = GatewayConfig::default();
        config.base_url = "https://api.example.com".to_string();
        config.stream_url = "wss://stream.example.com/custom".to_string();
        assert_eq!(
            config.derived_stream_url().unwrap(),
            "wss://stream.example.com/custom"
        );
    }

    #[test]
    fn test_stream_url_missing_base() {
        let config = GatewayConfig::default();
        assert!(config.derived_stream_url().is_none());
    }

    #[test]
    fn test_metrics_interval_zero_disables() {
        let mut config = GatewayConfig::default();
        config.metrics_interval_secs = 0;
        assert_eq!(config.clamped_metrics_interval_secs(), 0);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway.json");

        let mut config = GatewayConfig::default();
        config.base_url = "https://api.example.com".to_string();
        config.galaxy_id = 7;
        config.fail_open = true;
        config.save(&path).unwrap();

        let loaded = GatewayConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.base_url, "https://api.example.com");
        assert_eq!(loaded.galaxy_id, 7);
        assert!(loaded.fail_open);
    }

    #[test]
    fn test_config_load_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        std::fs::write(&path, r#"{"base_url": "https://api.example.com"}"#).unwrap();

        let config = GatewayConfig::load_from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.wal_retention_hours, 6);
    }

    #[test]
    fn test_base_url_parse() {
        let mut config = GatewayConfig::default();
        config.base_url = "not a url".to_string();
        assert!(config.base_url().is_err());

        config.base_url = "https://api.example.com".to_string();
        assert_eq!(config.base_url().unwrap().scheme(), "https");
    }

    #[test]
    fn test_wal_retention_duration() {
        let mut config = GatewayConfig::default();
        config.wal_retention_hours = 2;
        assert_eq!(config.wal_retention(), Duration::from_secs(7200));
    }
}
