/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "10s";

// Storage defaults
pub const DEFAULT_ARTIFACT_PATH: &str = "./storage";

// Cache defaults
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_COALESCE_REQUESTS: bool = false;

// Source defaults
pub const DEFAULT_MAX_BODY_SIZE: usize = 20 * 1024 * 1024; // 20MB

// Transform defaults
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = false;

// Environment
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "PREVIEWER_";
