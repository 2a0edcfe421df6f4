// Configuration validation utilities

use std::net::SocketAddr;

use url::Url;

use crate::config::{ CacheConfig, Config, ConfigError, DashboardConfig, ServerConfig, SourcesConfig };

/// Comprehensive configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate all configuration settings
    pub fn validate_all(config: &Config) -> Result<(), ConfigError> {
        Self::validate_server_config(&config.server)?;
        Self::validate_sources_config(&config.sources)?;
        Self::validate_cache_config(&config.cache)?;
        Self::validate_dashboard_config(&config.dashboard)?;
        Ok(())
    }

    pub fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
        config.addr.parse::<SocketAddr>().map_err(|_| {
            ConfigError::Config(
                format!("SERVER_ADDR must be a socket address like 127.0.0.1:8080, got '{}'", config.addr)
            )
        })?;

        if !["development", "staging", "production"].contains(&config.environment.as_str()) {
            return Err(
                ConfigError::Config(
                    "ENVIRONMENT must be one of: development, staging, production".to_string()
                )
            );
        }

        match Url::parse(&config.allowed_origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "CORS_ALLOWED_ORIGIN".to_string(),
                    value: config.allowed_origin.clone(),
                });
            }
        }

        Ok(())
    }

    /// Validate upstream API hosts and request budget
    pub fn validate_sources_config(config: &SourcesConfig) -> Result<(), ConfigError> {
        for (name, host) in [
            ("LINKEDIN_API_HOST", &config.linkedin_host),
            ("TWITTER_API_HOST", &config.twitter_host),
            ("REDDIT_API_HOST", &config.reddit_host),
        ] {
            let parsed = Url::parse(&format!("https://{}", host)).map_err(|_| {
                ConfigError::Config(format!("{} is not a valid host name", name))
            })?;
            if parsed.host_str() != Some(host.as_str()) {
                return Err(
                    ConfigError::Config(format!("{} must be a bare host name without a path", name))
                );
            }
        }

        if let Some(key) = &config.rapidapi_key {
            if key.len() < 16 {
                return Err(
                    ConfigError::Config("RAPIDAPI_KEY looks truncated".to_string())
                );
            }
        }

        if config.timeout_secs < 1 || config.timeout_secs > 120 {
            return Err(
                ConfigError::Config("SOURCE_TIMEOUT_SECS must be between 1 and 120".to_string())
            );
        }

        if config.max_attempts < 1 || config.max_attempts > 10 {
            return Err(
                ConfigError::Config("SOURCE_MAX_ATTEMPTS must be between 1 and 10".to_string())
            );
        }

        if config.backoff_ms > 10_000 {
            return Err(
                ConfigError::Config("SOURCE_BACKOFF_MS must not exceed 10000".to_string())
            );
        }

        Ok(())
    }

    pub fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
        if config.bucket_seconds == 0 {
            return Err(
                ConfigError::Config("CACHE_BUCKET_SECS must be greater than zero".to_string())
            );
        }

        if config.max_entries == 0 {
            return Err(
                ConfigError::Config("CACHE_MAX_ENTRIES must be greater than zero".to_string())
            );
        }

        if let Some(redis_url) = &config.redis_url {
            if !redis_url.starts_with("redis://") && !redis_url.starts_with("rediss://") {
                return Err(
                    ConfigError::Config(
                        "REDIS_URL must start with redis:// or rediss://".to_string()
                    )
                );
            }

            Url::parse(redis_url).map_err(|_| {
                ConfigError::Config("REDIS_URL is not a valid URL".to_string())
            })?;
        }

        Ok(())
    }

    pub fn validate_dashboard_config(config: &DashboardConfig) -> Result<(), ConfigError> {
        if config.default_top_k > 100 {
            return Err(ConfigError::Config("DEFAULT_TOP_K must not exceed 100".to_string()));
        }

        if config.mock_posts_per_platform == 0 || config.mock_posts_per_platform > 1000 {
            return Err(
                ConfigError::Config("MOCK_POSTS_PER_PLATFORM must be between 1 and 1000".to_string())
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigValidator::validate_all(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_bad_server_addr() {
        let config = ServerConfig {
            addr: "localhost".to_string(),
            ..ServerConfig::default()
        };
        assert!(ConfigValidator::validate_server_config(&config).is_err());
    }

    #[test]
    fn rejects_non_http_cors_origin() {
        let config = ServerConfig {
            allowed_origin: "ftp://dashboard.local".to_string(),
            ..ServerConfig::default()
        };
        assert!(ConfigValidator::validate_server_config(&config).is_err());
    }

    #[test]
    fn rejects_host_with_path() {
        let config = SourcesConfig {
            reddit_host: "reddit-scraper2.p.rapidapi.com/search".to_string(),
            ..SourcesConfig::default()
        };
        assert!(ConfigValidator::validate_sources_config(&config).is_err());
    }

    #[test]
    fn rejects_non_redis_url() {
        let config = CacheConfig {
            redis_url: Some("http://localhost:6379".to_string()),
            ..CacheConfig::default()
        };
        assert!(ConfigValidator::validate_cache_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_cache_capacity() {
        let config = CacheConfig {
            max_entries: 0,
            ..CacheConfig::default()
        };
        assert!(ConfigValidator::validate_cache_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_bucket() {
        let config = CacheConfig {
            bucket_seconds: 0,
            ..CacheConfig::default()
        };
        assert!(ConfigValidator::validate_cache_config(&config).is_err());
    }
}
