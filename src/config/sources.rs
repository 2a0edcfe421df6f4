use std::time::Duration;

use super::{ env_opt, env_or, env_parse, ConfigError };

/// Credentials and endpoints for the live RapidAPI search sources.
#[derive(Clone)]
pub struct SourcesConfig {
    pub rapidapi_key: Option<String>,
    pub linkedin_host: String,
    pub twitter_host: String,
    pub reddit_host: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            rapidapi_key: None,
            linkedin_host: "linkedin-api8.p.rapidapi.com".to_string(),
            twitter_host: "twitter154.p.rapidapi.com".to_string(),
            reddit_host: "reddit-scraper2.p.rapidapi.com".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            backoff_ms: 250,
        }
    }
}

// Keep the API key out of logs.
impl std::fmt::Debug for SourcesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcesConfig")
            .field("rapidapi_key", &self.rapidapi_key.as_ref().map(|_| "<redacted>"))
            .field("linkedin_host", &self.linkedin_host)
            .field("twitter_host", &self.twitter_host)
            .field("reddit_host", &self.reddit_host)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_ms", &self.backoff_ms)
            .finish()
    }
}

impl SourcesConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            rapidapi_key: env_opt("RAPIDAPI_KEY"),
            linkedin_host: env_or("LINKEDIN_API_HOST", &defaults.linkedin_host),
            twitter_host: env_or("TWITTER_API_HOST", &defaults.twitter_host),
            reddit_host: env_or("REDDIT_API_HOST", &defaults.reddit_host),
            timeout_secs: env_parse("SOURCE_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_attempts: env_parse("SOURCE_MAX_ATTEMPTS", defaults.max_attempts)?,
            backoff_ms: env_parse("SOURCE_BACKOFF_MS", defaults.backoff_ms)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn live_enabled(&self) -> bool {
        self.rapidapi_key.is_some()
    }
}
