use axum::{
    extract::{ rejection::QueryRejection, Query, RawQuery, State },
    response::Html,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    dto::post_dtos::{ DashboardQuery, DashboardResponse, InvalidateQuery, InvalidateResponse },
    errors::{ ErrorMessage, HttpError },
    models::{ ApiResponse, Platform },
    services::dashboard_service::DashboardResult,
    AppState,
};

async fn run_dashboard(
    state: &AppState,
    query: Result<Query<DashboardQuery>, QueryRejection>
) -> Result<DashboardResult, HttpError> {
    let Query(query) = query.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let request = query.into_request(state.dashboard.settings(), Utc::now())?;
    Ok(state.dashboard.run(&request).await?)
}

/// GET FILTERED POSTS AND SUMMARY
pub async fn get_posts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DashboardQuery>, QueryRejection>
) -> Result<Json<ApiResponse<DashboardResponse>>, HttpError> {
    let result = run_dashboard(&state, query).await?;
    let message = format!("{} posts matched", result.posts.len());

    Ok(Json(ApiResponse::ok(DashboardResponse::from(result), message)))
}

/// RENDER THE HTML DASHBOARD
pub async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
    query: Result<Query<DashboardQuery>, QueryRejection>
) -> Result<Html<String>, HttpError> {
    let result = run_dashboard(&state, query).await?;
    let html = state.renderer.render(&result, raw.as_deref().unwrap_or(""))?;
    Ok(Html(html))
}

/// DROP CACHED SOURCE DATA FOR ONE PLATFORM, OR ALL OF THEM
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InvalidateQuery>
) -> Result<Json<ApiResponse<InvalidateResponse>>, HttpError> {
    let platform = match params.platform.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) =>
            Some(
                raw
                    .parse::<Platform>()
                    .map_err(|e| HttpError::bad_request(ErrorMessage::InvalidPlatform(e.0).to_string()))?
            ),
        None => None,
    };

    let cache = state.dashboard.cache();
    let invalidated = match platform {
        Some(platform) => cache.invalidate_platform(platform).await,
        None => cache.invalidate_all().await,
    };

    Ok(
        Json(
            ApiResponse::ok(
                InvalidateResponse { platform, invalidated },
                format!("Invalidated {} cache entries", invalidated)
            )
        )
    )
}
