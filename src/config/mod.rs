use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AppError, AppResult};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for a whole request, including the upstream fetch.
    /// Also bounds how long shutdown waits for in-flight requests.
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Flat directory holding resized artifacts, one file per cache key
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries held by the LRU cache
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Make concurrent requests for the same key wait for the first one
    #[serde(default = "default_coalesce_requests")]
    pub coalesce_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Maximum accepted size of a source image body in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Largest width or height a client may request
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_json")]
    pub json: bool,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_REQUEST_TIMEOUT).unwrap_or(Duration::from_secs(10))
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_coalesce_requests() -> bool {
    DEFAULT_COALESCE_REQUESTS
}

fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

fn default_user_agent() -> String {
    format!("image-previewer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_json() -> bool {
    DEFAULT_LOG_JSON
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            coalesce_requests: default_coalesce_requests(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_body_size: default_max_body_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_log_json(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            source: SourceConfig::default(),
            transform: TransformConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Layer defaults, the TOML file (if present) and `PREVIEWER_*` environment
    /// variables, then validate the result.
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> AppResult<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.cache.capacity == 0 {
            return Err(AppError::configuration(
                "cache.capacity must be a positive number of entries",
            ));
        }
        if self.transform.max_dimension == 0 {
            return Err(AppError::configuration(
                "transform.max_dimension must be positive",
            ));
        }
        if self.web.request_timeout.is_zero() {
            return Err(AppError::configuration("web.request_timeout must be non-zero"));
        }
        if self.storage.artifact_path.as_os_str().is_empty() {
            return Err(AppError::configuration("storage.artifact_path must not be empty"));
        }
        Ok(())
    }

    /// Cache capacity as a non-zero value; `validate` guarantees it is positive
    pub fn cache_capacity(&self) -> AppResult<NonZeroUsize> {
        NonZeroUsize::new(self.cache.capacity).ok_or_else(|| {
            AppError::configuration("cache.capacity must be a positive number of entries")
        })
    }

    /// Address the web server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }
}
