use std::sync::Arc;

use axum::Router;

use crate::AppState;

pub mod cache;
pub mod posts;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().merge(posts::post_routes()).merge(cache::cache_routes())
}
