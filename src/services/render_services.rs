use handlebars::Handlebars;
use serde::Serialize;
use tracing::error;

use crate::{ config::ConfigError, errors::{ ErrorMessage, HttpError }, models::Post };

use super::dashboard_service::DashboardResult;

const DASHBOARD_TEMPLATE: &str = "dashboard";

#[derive(Debug, Serialize)]
struct PostRow {
    platform: String,
    author: String,
    timestamp: String,
    content: String,
    url: Option<String>,
    community: Option<String>,
    likes: u64,
    comments: u64,
    shares: u64,
    total: u64,
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        Self {
            platform: post.platform.to_string(),
            author: post.author.clone(),
            timestamp: post.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            content: post.content.clone(),
            url: post.url.clone(),
            community: post.community.clone(),
            likes: post.engagement.likes,
            comments: post.engagement.comments,
            shares: post.engagement.shares,
            total: post.total_engagement(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PlatformBar {
    platform: String,
    count: usize,
    total: u64,
    mean: String,
    /// Bar width relative to the busiest platform, 0-100.
    percent: u64,
}

#[derive(Debug, Serialize)]
struct DayBar {
    day: String,
    count: usize,
    percent: u64,
}

#[derive(Debug, Serialize)]
struct DashboardView<'a> {
    query: &'a str,
    total_posts: usize,
    total_engagement: u64,
    mean_engagement: String,
    max_engagement: u64,
    unique_authors: usize,
    skipped_records: usize,
    duplicate_records: usize,
    fallback_platforms: Vec<String>,
    bars: Vec<PlatformBar>,
    days: Vec<DayBar>,
    top_posts: Vec<PostRow>,
    posts: Vec<PostRow>,
}

/// Renders a dashboard cycle as a self-contained HTML page.
pub struct DashboardRenderer {
    registry: Handlebars<'static>,
}

impl DashboardRenderer {
    pub fn new() -> Result<Self, ConfigError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(DASHBOARD_TEMPLATE, include_str!("../templates/dashboard.hbs"))
            .map_err(|e| ConfigError::Template(e.to_string()))?;

        Ok(Self { registry })
    }

    /// `query` is the raw query string, echoed into the refresh form.
    pub fn render(&self, result: &DashboardResult, query: &str) -> Result<String, HttpError> {
        let summary = &result.summary;
        let busiest = summary.totals.values().copied().max().unwrap_or(0);

        let bars = summary.totals
            .iter()
            .map(|(platform, total)| PlatformBar {
                platform: platform.to_string(),
                count: summary.counts.get(platform).copied().unwrap_or(0),
                total: *total,
                mean: format!("{:.1}", summary.means.get(platform).copied().unwrap_or(0.0)),
                percent: percent_of(*total, busiest),
            })
            .collect();

        let busiest_day = summary.posts_by_day.values().copied().max().unwrap_or(0);
        let days = summary.posts_by_day
            .iter()
            .map(|(day, count)| DayBar {
                day: day.format("%Y-%m-%d").to_string(),
                count: *count,
                percent: percent_of(*count as u64, busiest_day as u64),
            })
            .collect();

        let view = DashboardView {
            query,
            total_posts: summary.total_posts,
            total_engagement: summary.total_engagement,
            mean_engagement: format!("{:.1}", summary.mean_engagement),
            max_engagement: summary.max_engagement,
            unique_authors: summary.unique_authors,
            skipped_records: result.skipped_records,
            duplicate_records: result.duplicate_records,
            fallback_platforms: result.fallback_platforms
                .iter()
                .map(|p| p.to_string())
                .collect(),
            bars,
            days,
            top_posts: summary.top_posts.iter().map(PostRow::from).collect(),
            posts: result.posts.iter().map(PostRow::from).collect(),
        };

        self.registry.render(DASHBOARD_TEMPLATE, &view).map_err(|e| {
            error!("Dashboard render failed: {}", e);
            HttpError::server_error(ErrorMessage::RenderError.to_string())
        })
    }
}

/// `part` as a whole percentage of `whole`, computed wide so huge totals
/// cannot overflow.
fn percent_of(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    ((u128::from(part) * 100) / u128::from(whole)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{ TimeZone, Utc };
    use crate::{
        models::{ Engagement, Platform },
        services::aggregator::aggregate,
    };

    fn post(platform: Platform, content: &str, likes: u64) -> Post {
        Post {
            id: content.to_string(),
            platform,
            author: "Dr. Example".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
            content: content.to_string(),
            url: None,
            community: None,
            engagement: Engagement::new(likes, 0, 0),
        }
    }

    fn result(posts: Vec<Post>) -> DashboardResult {
        DashboardResult {
            summary: aggregate(&posts, 2),
            posts,
            skipped_records: 3,
            duplicate_records: 2,
            fallback_platforms: vec![Platform::LinkedIn],
        }
    }

    #[test]
    fn renders_table_chart_and_notices() {
        let renderer = DashboardRenderer::new().unwrap();
        let html = renderer
            .render(
                &result(
                    vec![
                        post(Platform::Reddit, "Waiting list <update>", 10),
                        post(Platform::Twitter, "Clinic launch", 5)
                    ]
                ),
                "platforms=Reddit,Twitter"
            )
            .unwrap();

        assert!(html.contains("Clinic launch"));
        assert!(html.contains("Waiting list &lt;update&gt;"));
        assert!(html.contains("width: 100%"));
        assert!(html.contains("width: 50%"));
        assert!(html.contains("3 records could not be read"));
        assert!(html.contains("2 duplicate posts were merged"));
        assert!(html.contains("Unique authors<strong>1</strong>"));
        assert!(html.contains("2024-01-02"));
        assert!(html.contains("LinkedIn"));
    }

    #[test]
    fn bar_widths_survive_huge_totals() {
        assert_eq!(percent_of(u64::MAX, u64::MAX), 100);
        assert_eq!(percent_of(u64::MAX / 2, u64::MAX), 49);
        assert_eq!(percent_of(5, 0), 0);

        let renderer = DashboardRenderer::new().unwrap();
        let mut huge = post(Platform::Reddit, "Viral", 0);
        huge.engagement = Engagement::new(u64::MAX, 0, 0);
        let html = renderer.render(&result(vec![huge, post(Platform::Twitter, "Quiet", 1)]), "").unwrap();
        assert!(html.contains("width: 100%"));
    }

    #[test]
    fn renders_empty_result() {
        let renderer = DashboardRenderer::new().unwrap();
        let html = renderer.render(&result(Vec::new()), "").unwrap();
        assert!(html.contains("No posts match"));
    }
}
