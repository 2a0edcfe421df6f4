use std::sync::Arc;

use axum::{ routing::post, Router };

use crate::{ handlers::dashboard_handlers::invalidate_cache, AppState };

// CACHE ROUTER
pub fn cache_routes() -> Router<Arc<AppState>> {
    Router::new().route("/cache/invalidate", post(invalidate_cache))
}
