// Library entry point - exposes the post-pulse pipeline and HTTP app as a reusable library

pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use config::{ Config, ConfigError };
pub use errors::{ ErrorMessage, HttpError };
pub use models::{ Engagement, Platform, Post };
pub use services::{
    cache_services::{ QueryCache, RedisCache },
    dashboard_service::DashboardService,
    render_services::DashboardRenderer,
};

use std::sync::Arc;
use axum::{ middleware::from_fn, Router };
use tower_http::trace::TraceLayer;
use tracing::info;

use middleware::{ cors::create_cors_layer, security_headers::security_headers };

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub dashboard: Arc<DashboardService>,
    pub renderer: Arc<DashboardRenderer>,
}

impl AppState {
    /// Build the application state, connecting the Redis mirror when configured
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let redis = config.cache
            .redis_client()?
            .map(|client| RedisCache::new(client, config.cache.bucket_seconds));
        if redis.is_some() {
            info!("Mirroring query cache to Redis");
        }

        let cache = Arc::new(
            QueryCache::new(config.cache.bucket_seconds, config.cache.max_entries, redis)
        );
        Self::with_cache(config, cache)
    }

    /// Application state with an in-process cache only
    pub fn for_testing(config: Config) -> Result<Self, ConfigError> {
        let cache = Arc::new(
            QueryCache::new(config.cache.bucket_seconds, config.cache.max_entries, None)
        );
        Self::with_cache(config, cache)
    }

    fn with_cache(config: Config, cache: Arc<QueryCache>) -> Result<Self, ConfigError> {
        let dashboard = Arc::new(DashboardService::from_config(&config, cache));
        let renderer = Arc::new(DashboardRenderer::new()?);

        Ok(Self {
            config,
            dashboard,
            renderer,
        })
    }
}

/// Create the complete application router with middleware applied
pub fn create_app(state: Arc<AppState>) -> Result<Router, ConfigError> {
    let cors = create_cors_layer(&state.config.server)?;

    Ok(
        routes
            ::create_router()
            .with_state(state)
            .layer(cors)
            .layer(from_fn(security_headers))
            .layer(TraceLayer::new_for_http())
    )
}

/// Initialize the application with all dependencies
pub fn initialize_app(config: Config) -> Result<Router, ConfigError> {
    let state = Arc::new(AppState::new(config)?);
    create_app(state)
}
