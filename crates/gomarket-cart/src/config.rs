//! # Cart Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GOMARKET_STORAGE_BACKEND=sqlite                                    │
//! │     GOMARKET_DB_PATH=/tmp/cart.db                                      │
//! │     GOMARKET_CART_KEY=@GoMarketing/cart                                │
//! │     GOMARKET_LOG=debug                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cart/cart.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.gomarket.cart/cart.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     sqlite backend in the platform data dir, key @GoMarketing/cart     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! backend = "sqlite"        # memory | sqlite
//! database_path = "/var/lib/gomarket/cart.db"
//! key = "@GoMarketing/cart"
//! connect_timeout_secs = 30
//!
//! [persistence]
//! retry_max_elapsed_ms = 2000   # 0 disables retries
//! error_channel_capacity = 16
//!
//! [logging]
//! filter = "info,gomarket=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use gomarket_core::CART_STORAGE_KEY;

use crate::error::{CartError, CartResult};

// =============================================================================
// Storage Backend
// =============================================================================

/// Which [`gomarket_db::KeyValueStore`] backs the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process memory. The cart does not survive a restart.
    Memory,

    /// SQLite file in the data directory.
    #[default]
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "mem" => Ok(StorageBackend::Memory),
            "sqlite" | "sqlite3" | "db" => Ok(StorageBackend::Sqlite),
            other => Err(CartError::InvalidConfig(format!(
                "Unknown storage backend: '{}'. Valid options: memory, sqlite",
                other
            ))),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the cart is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Backend kind.
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite file. `None` means `<data dir>/cart.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Key the cart is stored under.
    #[serde(default = "default_key")]
    pub key: String,

    /// How long to wait for a SQLite connection (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_key() -> String {
    CART_STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: StorageBackend::default(),
            database_path: None,
            key: default_key(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Persistence Settings
// =============================================================================

/// Background writer behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// How long a failed write keeps being retried (milliseconds).
    /// 0 disables retries.
    #[serde(default = "default_retry_max_elapsed")]
    pub retry_max_elapsed_ms: u64,

    /// Buffered failures per error-channel subscriber before the oldest are
    /// dropped.
    #[serde(default = "default_error_channel_capacity")]
    pub error_channel_capacity: usize,
}

fn default_retry_max_elapsed() -> u64 {
    2_000
}

fn default_error_channel_capacity() -> usize {
    16
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        PersistenceSettings {
            retry_max_elapsed_ms: default_retry_max_elapsed(),
            error_channel_capacity: default_error_channel_capacity(),
        }
    }
}

impl PersistenceSettings {
    /// Settings with retries disabled.
    pub fn without_retries() -> Self {
        PersistenceSettings {
            retry_max_elapsed_ms: 0,
            ..Self::default()
        }
    }

    /// Retry window as a duration, `None` when retries are disabled.
    pub fn retry_window(&self) -> Option<Duration> {
        (self.retry_max_elapsed_ms > 0).then(|| Duration::from_millis(self.retry_max_elapsed_ms))
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// Default log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    crate::telemetry::DEFAULT_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Main Cart Configuration
// =============================================================================

/// Complete cart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub persistence: PersistenceSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl CartConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for an in-memory cart (tests, ephemeral sessions).
    pub fn in_memory() -> Self {
        CartConfig {
            storage: StorageSettings {
                backend: StorageBackend::Memory,
                ..StorageSettings::default()
            },
            ..Self::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (cart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CartResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml(contents: &str) -> CartResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CartResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CartError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CartError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| CartError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Cart config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CartResult<()> {
        if self.storage.key.trim().is_empty() {
            return Err(CartError::InvalidConfig(
                "storage.key must not be empty".into(),
            ));
        }

        if self.storage.connect_timeout_secs == 0 {
            return Err(CartError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.persistence.error_channel_capacity == 0 {
            return Err(CartError::InvalidConfig(
                "error_channel_capacity must be greater than 0".into(),
            ));
        }

        if self.storage.backend == StorageBackend::Sqlite && self.database_path().is_none() {
            return Err(CartError::InvalidConfig(
                "No database_path configured and no platform data directory available".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(backend) = std::env::var("GOMARKET_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(e) => warn!(backend = %backend, error = %e, "Ignoring storage backend from environment"),
            }
        }

        if let Ok(path) = std::env::var("GOMARKET_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Ok(key) = std::env::var("GOMARKET_CART_KEY") {
            self.storage.key = key;
        }

        if let Ok(filter) = std::env::var("GOMARKET_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("cart.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.storage.key
    }

    /// SQLite connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.connect_timeout_secs)
    }

    /// SQLite file to use: the configured one, else `<data dir>/cart.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .database_path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("cart.db")))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "gomarket", "cart")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("SQLite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();
        assert_eq!(config.key(), "@GoMarketing/cart");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.persistence.retry_max_elapsed_ms, 2_000);
        assert_eq!(config.persistence.error_channel_capacity, 16);
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CartConfig::from_toml(
            r#"
            [storage]
            backend = "memory"

            [persistence]
            retry_max_elapsed_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.key(), "@GoMarketing/cart");
        assert_eq!(config.persistence.retry_window(), None);
        assert_eq!(config.persistence.error_channel_capacity, 16);
        assert_eq!(config.logging.filter, "info,gomarket=debug,sqlx=warn");
    }

    #[test]
    fn test_bad_toml_is_load_error() {
        let err = CartConfig::from_toml("[storage]\nbackend = 3").unwrap_err();
        assert!(matches!(err, CartError::ConfigLoadFailed(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = CartConfig::in_memory();
        assert!(config.validate().is_ok());

        config.storage.key = "  ".into();
        assert!(config.validate().is_err());

        config.storage.key = "cart".into();
        config.storage.connect_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.storage.connect_timeout_secs = 5;
        config.persistence.error_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let mut config = CartConfig::default();
        config.storage.database_path = Some(PathBuf::from("/tmp/x.db"));
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&CartConfig::default()).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[persistence]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "gomarket-cart-config-{}.toml",
            std::process::id()
        ));
        let mut config = CartConfig::in_memory();
        config.storage.key = "test/cart".into();

        config.save(Some(path.clone())).unwrap();
        let loaded = CartConfig::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.key(), "test/cart");
        assert_eq!(loaded.storage.backend, StorageBackend::Memory);
    }
}
