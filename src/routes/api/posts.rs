use std::sync::Arc;

use axum::{ routing::get, Router };

use crate::{ handlers::dashboard_handlers::get_posts, AppState };

// POST ROUTER
pub fn post_routes() -> Router<Arc<AppState>> {
    Router::new().route("/posts", get(get_posts))
}
