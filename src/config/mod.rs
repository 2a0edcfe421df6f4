pub mod cache;
pub mod logging;
pub mod server;
pub mod sources;
pub mod validation;

use std::{ env, str::FromStr };

use thiserror::Error;

pub use cache::CacheConfig;
pub use server::{ DashboardConfig, ServerConfig };
pub use sources::SourcesConfig;
use validation::ConfigValidator;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")] MissingEnv(#[from] env::VarError),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Invalid value for {name}: {value}")] InvalidValue {
        name: String,
        value: String,
    },

    #[error("Redis error: {0}")] Redis(#[from] redis::RedisError),

    #[error("Template error: {0}")] Template(String),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub sources: SourcesConfig,
    pub cache: CacheConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Read every setting from the environment once, at process start.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            server: ServerConfig::from_env()?,
            sources: SourcesConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            dashboard: DashboardConfig::from_env()?,
        };

        ConfigValidator::validate_all(&config)?;
        Ok(config)
    }
}

pub(crate) fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env_opt(name) {
        None => Ok(default),
        Some(raw) =>
            raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
    }
}

pub(crate) fn env_parse_opt<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env_opt(name) {
        None => Ok(None),
        Some(raw) =>
            raw
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    name: name.to_string(),
                    value: raw,
                }),
    }
}
