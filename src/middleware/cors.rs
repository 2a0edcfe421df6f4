use axum::http::{ HeaderName, HeaderValue, Method };
use tower_http::cors::CorsLayer;

use crate::config::{ ConfigError, ServerConfig };

/// The dashboard is read-only apart from cache invalidation, so only GET and
/// POST are allowed, and never with credentials.
pub fn create_cors_layer(server: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    let origin = server.allowed_origin.parse::<HeaderValue>().map_err(|_| {
        ConfigError::InvalidValue {
            name: "CORS_ALLOWED_ORIGIN".to_string(),
            value: server.allowed_origin.clone(),
        }
    })?;

    let layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_headers([HeaderName::from_static("content-type"), HeaderName::from_static("accept")]);

    if server.is_production() {
        Ok(layer.allow_methods([Method::GET, Method::POST]))
    } else {
        Ok(layer.allow_methods([Method::GET, Method::POST, Method::OPTIONS]))
    }
}
