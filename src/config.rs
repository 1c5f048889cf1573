//! Bridge configuration types and persistence
//!
//! Handles loading and saving the bridge configuration from disk. All request
//! timeouts and polling bounds live here so retry policy is auditable in one
//! place.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "BSV-Browser";

/// Single BSV/USD price source
pub const DEFAULT_PRICE_API_URL: &str =
    "https://min-api.cryptocompare.com/data/price?fsym=BSV&tsyms=USD";

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_readiness_attempts() -> u32 {
    40
}

fn default_readiness_interval_ms() -> u64 {
    50
}

fn default_price_api_url() -> String {
    DEFAULT_PRICE_API_URL.to_string()
}

fn default_price_timeout_ms() -> u64 {
    5_000
}

fn default_balance_refresh_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bridge configuration stored in bridge_config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Default deadline for correlated requests (overridable per call)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How many times to check for the host bridge before giving up
    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,

    /// Delay between readiness checks
    #[serde(default = "default_readiness_interval_ms")]
    pub readiness_interval_ms: u64,

    /// Price API endpoint (CryptoCompare `{ "USD": <price> }` format)
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,

    /// HTTP timeout for the price request
    #[serde(default = "default_price_timeout_ms")]
    pub price_timeout_ms: u64,

    /// Balance auto-refresh period (0 disables)
    #[serde(default = "default_balance_refresh_secs")]
    pub balance_refresh_secs: u64,

    /// Log level filter (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Override for the log directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            readiness_attempts: default_readiness_attempts(),
            readiness_interval_ms: default_readiness_interval_ms(),
            price_api_url: default_price_api_url(),
            price_timeout_ms: default_price_timeout_ms(),
            balance_refresh_secs: default_balance_refresh_secs(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl BridgeConfig {
    /// Directory holding the config file and, by default, the logs
    pub fn app_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Get the path to the bridge config file
    pub fn config_path() -> PathBuf {
        Self::app_dir().join("bridge_config.json")
    }

    /// Load config from disk, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring unreadable config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, contents).map_err(|e| format!("Failed to write config: {}", e))?;

        log::info!("Bridge config saved to {}", path.display());
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    pub fn price_timeout(&self) -> Duration {
        Duration::from_millis(self.price_timeout_ms)
    }

    /// `None` when auto-refresh is disabled
    pub fn balance_refresh(&self) -> Option<Duration> {
        (self.balance_refresh_secs > 0).then(|| Duration::from_secs(self.balance_refresh_secs))
    }

    /// Effective log directory (override or `<app_dir>/logs`)
    pub fn log_directory(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => Self::app_dir().join("logs"),
        }
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.readiness_attempts, 40);
        assert_eq!(config.readiness_interval(), Duration::from_millis(50));
        assert_eq!(config.balance_refresh(), Some(Duration::from_secs(30)));
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bridge_config.json");
        fs::write(&path, r#"{ "requestTimeoutMs": 5000, "balanceRefreshSecs": 0 }"#).unwrap();

        let config = BridgeConfig::load_from(&path);
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.balance_refresh(), None);
        assert_eq!(config.price_api_url, DEFAULT_PRICE_API_URL);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bridge_config.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(BridgeConfig::load_from(&path), BridgeConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("bridge_config.json");

        let mut config = BridgeConfig::default();
        config.log_level = "debug".to_string();
        config.log_dir = Some("/tmp/bsv-logs".to_string());
        config.save_to(&path).unwrap();

        let loaded = BridgeConfig::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_directory(), PathBuf::from("/tmp/bsv-logs"));
        assert_eq!(loaded.log_level_filter(), log::LevelFilter::Debug);
    }
}
