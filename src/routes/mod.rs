use std::sync::Arc;

use axum::Router;

use crate::AppState;

pub mod api;
pub mod general_router;

use api::api_routes;
use general_router::general_routes;

/// Main application router assembly function
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // JSON API (posts, cache)
        .nest("/api", api_routes())
        // HTML dashboard, health check, 404 fallback
        .merge(general_routes())
}
