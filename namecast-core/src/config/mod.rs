//! Configuration management for Namecast
//!
//! Defaults, a TOML file, and `NAMECAST_<SECTION>_<KEY>` environment
//! overrides, applied in that order.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

use crate::logging::{LogConfig, LogLevel};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub node: NodeConfig,
    pub pubsub: PubsubConfig,
    pub store: StoreConfig,
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// File holding the node keypair
    pub identity_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PubsubConfig {
    /// Experimental: resolve and relay names over pubsub
    pub enabled: bool,

    /// Largest accepted record payload in bytes, outgoing and incoming
    pub max_record_size: usize,

    /// Per-topic delivery buffer
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Directory for the sqlite database
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum `/ipns/` hops for recursive resolution
    pub max_depth: usize,

    /// Resolved names kept in the cache
    pub cache_size: usize,

    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub json_format: bool,
    pub with_timestamp: bool,
    pub with_target: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            identity_path: PathBuf::from("./data/identity.json"),
        }
    }
}

impl Default for PubsubConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_record_size: 10 * 1024,
            channel_capacity: 256,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            cache_size: 128,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level: LogLevel = self
            .level
            .parse()
            .map_err(|e| ConfigError::ValidationFailed(format!("{}", e)))?;

        Ok(LogConfig::new(level)
            .with_timestamp(self.with_timestamp)
            .with_target(self.with_target)
            .json_format(self.json_format))
    }
}

fn env_parse<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Overlay `NAMECAST_*` environment variables and re-validate
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = env_parse::<PathBuf>("NAMECAST_NODE_IDENTITY_PATH")? {
            self.node.identity_path = path;
        }

        if let Some(enabled) = env_parse("NAMECAST_PUBSUB_ENABLED")? {
            self.pubsub.enabled = enabled;
        }
        if let Some(size) = env_parse("NAMECAST_PUBSUB_MAX_RECORD_SIZE")? {
            self.pubsub.max_record_size = size;
        }
        if let Some(capacity) = env_parse("NAMECAST_PUBSUB_CHANNEL_CAPACITY")? {
            self.pubsub.channel_capacity = capacity;
        }

        if let Some(backend) = env_parse("NAMECAST_STORE_BACKEND")? {
            self.store.backend = backend;
        }
        if let Some(dir) = env_parse::<PathBuf>("NAMECAST_STORE_DATA_DIR")? {
            self.store.data_dir = dir;
        }

        if let Some(depth) = env_parse("NAMECAST_RESOLVER_MAX_DEPTH")? {
            self.resolver.max_depth = depth;
        }
        if let Some(size) = env_parse("NAMECAST_RESOLVER_CACHE_SIZE")? {
            self.resolver.cache_size = size;
        }

        if let Some(level) = env_parse::<String>("NAMECAST_LOG_LEVEL")? {
            self.logging.level = level;
        }
        if let Some(json) = env_parse("NAMECAST_LOG_JSON")? {
            self.logging.json_format = json;
        }

        if let Some(enabled) = env_parse("NAMECAST_METRICS_ENABLED")? {
            self.metrics.enabled = enabled;
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pubsub.max_record_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "pubsub.max_record_size must be greater than 0".to_string(),
            ));
        }

        if self.pubsub.channel_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "pubsub.channel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.resolver.max_depth == 0 {
            return Err(ConfigError::ValidationFailed(
                "resolver.max_depth must be greater than 0".to_string(),
            ));
        }

        if self.resolver.cache_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "resolver.cache_size must be greater than 0".to_string(),
            ));
        }

        self.logging.to_log_config()?;

        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}
