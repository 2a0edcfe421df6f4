use redis::Client;

use super::{ env_opt, env_parse, ConfigError };

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Width of a cache time bucket; entries from an older bucket are stale.
    pub bucket_seconds: u64,
    /// Upper bound on batches held in process.
    pub max_entries: usize,
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket_seconds: 300,
            max_entries: 1000,
            redis_url: None,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bucket_seconds: env_parse("CACHE_BUCKET_SECS", defaults.bucket_seconds)?,
            max_entries: env_parse("CACHE_MAX_ENTRIES", defaults.max_entries)?,
            redis_url: env_opt("REDIS_URL"),
        })
    }

    /// Open a client for the configured Redis mirror, if any.
    pub fn redis_client(&self) -> Result<Option<Client>, ConfigError> {
        match &self.redis_url {
            Some(url) => Ok(Some(Client::open(url.as_str())?)),
            None => Ok(None),
        }
    }
}
