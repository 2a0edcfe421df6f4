use super::{ env_or, env_parse, env_parse_opt, ConfigError };

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub environment: String,
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            environment: "development".to_string(),
            allowed_origin: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            addr: env_or("SERVER_ADDR", &defaults.addr),
            environment: env_or("ENVIRONMENT", &defaults.environment),
            allowed_origin: env_or("CORS_ALLOWED_ORIGIN", &defaults.allowed_origin),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Defaults applied to dashboard requests that leave a knob unset.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub default_top_k: usize,
    pub mock_seed: Option<u64>,
    pub mock_posts_per_platform: usize,
    /// Serve mock data when a live source fails instead of returning 502.
    pub fallback_to_mock: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            mock_seed: None,
            mock_posts_per_platform: 20,
            fallback_to_mock: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            default_top_k: env_parse("DEFAULT_TOP_K", defaults.default_top_k)?,
            mock_seed: env_parse_opt("MOCK_SEED")?,
            mock_posts_per_platform: env_parse(
                "MOCK_POSTS_PER_PLATFORM",
                defaults.mock_posts_per_platform
            )?,
            fallback_to_mock: env_parse("FALLBACK_TO_MOCK", defaults.fallback_to_mock)?,
        })
    }
}
