// Test utilities and router-level integration tests

pub mod test_utils {
    use std::sync::Arc;

    use axum::{ body::Body, http::{ Request, StatusCode }, Router };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::{ config::{ Config, DashboardConfig }, create_app, AppState };

    pub fn test_config() -> Config {
        Config {
            dashboard: DashboardConfig {
                mock_seed: Some(42),
                mock_posts_per_platform: 15,
                ..DashboardConfig::default()
            },
            ..Config::default()
        }
    }

    pub fn setup_test_app() -> Router {
        let state = AppState::for_testing(test_config()).expect("Failed to build test state");
        create_app(Arc::new(state)).expect("Failed to build test router")
    }

    pub async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = app.oneshot(request).await.expect("Router failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect().await
            .expect("Failed to read body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(app, "GET", uri).await;
        let json = serde_json::from_str(&body).expect("Response was not JSON");
        (status, json)
    }
}

use axum::http::StatusCode;
use test_utils::*;

#[tokio::test]
async fn health_check_returns_ok() {
    let (status, body) = send(setup_test_app(), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, json) = get_json(setup_test_app(), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], "fail");
}

#[tokio::test]
async fn missing_platforms_is_bad_request() {
    let (status, json) = get_json(setup_test_app(), "/api/posts").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "fail");
    assert_eq!(json["message"], "At least one platform must be selected");

    let (status, _) = send(setup_test_app(), "GET", "/?min_engagement=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn every_selected_platform_is_summarised() {
    let (status, json) = get_json(setup_test_app(), "/api/posts?platforms=LinkedIn,Reddit,Twitter").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let data = &json["data"];
    let summary = &data["summary"];
    assert_eq!(data["skipped_records"], 0);
    assert_eq!(data["duplicate_records"], 0);
    assert_eq!(summary["total_posts"], 45);
    assert_eq!(summary["total_posts"].as_u64(), Some(data["posts"].as_array().unwrap().len() as u64));
    for platform in ["LinkedIn", "Reddit", "Twitter"] {
        assert_eq!(summary["counts"][platform], 15, "wrong {} count", platform);
    }
    assert!(summary["unique_authors"].as_u64().unwrap() >= 1);
    let per_day: u64 = summary["posts_by_day"]
        .as_object()
        .unwrap()
        .values()
        .map(|n| n.as_u64().unwrap())
        .sum();
    assert_eq!(per_day, 45);
    assert!(summary["top_posts"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
async fn search_keeps_posts_mentioning_a_term() {
    let uri = "/api/posts?platforms=Reddit,Twitter&search=DIABETES,hba1c";
    let (status, json) = get_json(setup_test_app(), uri).await;
    assert_eq!(status, StatusCode::OK);

    for post in json["data"]["posts"].as_array().unwrap() {
        let content = post["content"].as_str().unwrap().to_lowercase();
        assert!(content.contains("diabetes") || content.contains("hba1c"), "{}", content);
    }
}

#[tokio::test]
async fn upstream_options_are_validated() {
    let uri = "/api/posts?platforms=Reddit&reddit_sort=new&time_window=week&date_posted=past-24h&limit=4";
    let (status, json) = get_json(setup_test_app(), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["summary"]["counts"]["Reddit"], 4);

    let (status, _) = get_json(setup_test_app(), "/api/posts?platforms=Reddit&reddit_sort=best").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn filters_apply_to_returned_posts() {
    let uri = "/api/posts?platforms=Reddit&min_engagement=100&top_k=2&sort=engagement";
    let (status, json) = get_json(setup_test_app(), uri).await;
    assert_eq!(status, StatusCode::OK);

    let posts = json["data"]["posts"].as_array().unwrap();
    for post in posts {
        assert_eq!(post["platform"], "Reddit");
        assert!(post["total_engagement"].as_u64().unwrap() >= 100);
    }
    let top = json["data"]["summary"]["top_posts"].as_array().unwrap();
    assert!(top.len() <= 2);
    assert_eq!(json["data"]["summary"]["counts"]["Twitter"], 0);
    assert_eq!(json["data"]["summary"]["means"]["Twitter"], 0.0);
}

#[tokio::test]
async fn same_seed_gives_same_response() {
    let uri = "/api/posts?seed=7&platforms=Twitter,LinkedIn";
    let (_, first) = get_json(setup_test_app(), uri).await;
    let (_, second) = get_json(setup_test_app(), uri).await;
    assert_eq!(first["data"]["summary"]["totals"], second["data"]["summary"]["totals"]);
    assert_eq!(first["data"]["posts"], second["data"]["posts"]);
}

#[tokio::test]
async fn empty_platform_selection_is_bad_request() {
    let (status, json) = get_json(setup_test_app(), "/api/posts?platforms=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "fail");
    assert_eq!(json["message"], "At least one platform must be selected");
}

#[tokio::test]
async fn reversed_range_is_bad_request() {
    let (status, json) = get_json(
        setup_test_app(),
        "/api/posts?platforms=Reddit&start=2024-02-01&end=2024-01-01"
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().starts_with("Invalid date range"));
}

#[tokio::test]
async fn malformed_query_values_are_bad_request() {
    for uri in [
        "/api/posts?platforms=Reddit&min_engagement=lots",
        "/api/posts?platforms=MySpace",
        "/api/posts?platforms=Reddit&start=yesterday",
        "/api/posts?platforms=Reddit&source=csv",
        "/api/posts?platforms=Reddit&top_k=1000",
        "/api/posts?platforms=Reddit&limit=0",
    ] {
        let (status, json) = get_json(setup_test_app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json["status"], "fail");
    }
}

#[tokio::test]
async fn live_without_credentials_falls_back_to_mock() {
    let (status, json) = get_json(setup_test_app(), "/api/posts?source=live&platforms=Reddit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["fallback_platforms"], serde_json::json!(["Reddit"]));
}

#[tokio::test]
async fn dashboard_page_renders_html() {
    let (status, body) = send(setup_test_app(), "GET", "/?platforms=LinkedIn,Reddit").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("Engagement by platform"));
    assert!(body.contains("Posts by day"));
    assert!(body.contains("Unique authors"));
    assert!(body.contains("LinkedIn"));
    assert!(body.contains("href=\"/api/posts?platforms"));
}

#[tokio::test]
async fn cache_invalidation_reports_counts() {
    let app = setup_test_app();
    let (status, _) = get_json(app.clone(), "/api/posts?platforms=Reddit,Twitter").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "POST", "/api/cache/invalidate?platform=reddit").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["platform"], "Reddit");
    assert_eq!(json["data"]["invalidated"], 1);

    let (_, body) = send(app.clone(), "POST", "/api/cache/invalidate").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["invalidated"], 1);

    let (status, _) = send(app, "POST", "/api/cache/invalidate?platform=Friendster").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(setup_test_app(), request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
}
