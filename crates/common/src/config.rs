//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration (only needed by the Redis key-value backend).
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Federation configuration.
    pub federation: FederationConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Backend used by the federation key-value store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KvBackend {
    /// In-process map, lives as long as the server process.
    #[default]
    Memory,
    /// Shared Redis instance (requires the `redis` section).
    Redis,
}

/// Federation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FederationConfig {
    /// Whether federation is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Instance name.
    pub instance_name: String,
    /// Instance description.
    #[serde(default)]
    pub instance_description: Option<String>,
    /// Key-value backend for federation bookkeeping.
    #[serde(default)]
    pub kv: KvBackend,
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory served under `/public`.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Directory used to stage uploads before they are resized.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,
    /// Public base URL used to build image links.
    ///
    /// Falls back to the `API` environment variable, then to `server.url`.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            tmp_dir: default_tmp_dir(),
            api_url: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3333
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_redis_prefix() -> String {
    "fedblog".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("./public")
}

fn default_tmp_dir() -> PathBuf {
    PathBuf::from("./tmp")
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `FEDBLOG_ENV`)
    /// 4. Environment variables with `FEDBLOG__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is not an error
        let _ = dotenvy::dotenv();

        let env = std::env::var("FEDBLOG_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FEDBLOG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("FEDBLOG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Public base URL for image links, without a trailing slash.
    #[must_use]
    pub fn api_url(&self) -> String {
        self.storage
            .api_url
            .clone()
            .or_else(|| std::env::var("API").ok())
            .unwrap_or_else(|| self.server.url.clone())
            .trim_end_matches('/')
            .to_string()
    }
}
