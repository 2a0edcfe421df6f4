use axum::{ routing::get, Router };
use std::sync::Arc;
use crate::{ AppState, handlers::{ dashboard_handlers::dashboard_page, general_handlers::* } };

pub fn general_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/health", get(health_check))
        .fallback(handler_404)
}
