use std::collections::BTreeMap;

use chrono::{ DateTime, NaiveDate, TimeZone, Utc };
use serde::{ Deserialize, Serialize };
use validator::{ Validate, ValidationError };

use crate::{
    config::DashboardConfig,
    errors::{ ErrorMessage, FilterError, HttpError },
    models::{ Platform, Post },
    services::{
        aggregator::Summary,
        dashboard_service::{ DashboardRequest, DashboardResult, SortOrder, SourceMode },
        filter_engine::FilterCriteria,
        sources::SourceQuery,
    },
};

const REDDIT_SORTS: [&str; 6] = ["RELEVANCE", "TOP", "NEW", "HOT", "CONTROVERSIAL", "RISING"];
const TIME_WINDOWS: [&str; 6] = ["ALL", "YEAR", "MONTH", "WEEK", "DAY", "HOUR"];
const DATE_POSTED: [&str; 3] = ["past-24h", "past-week", "past-month"];

/// Query string accepted by both `GET /api/posts` and the HTML dashboard.
///
/// `platforms` is required; absent or empty is a usage error, never "all".
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub platforms: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub min_engagement: Option<u64>,

    #[validate(range(max = 100, message = "top_k cannot be larger than 100"))]
    pub top_k: Option<usize>,

    pub source: Option<String>,

    #[validate(length(max = 200, message = "Keyword cannot be longer than 200 characters"))]
    pub keyword: Option<String>,

    #[validate(length(max = 100, message = "Subreddit cannot be longer than 100 characters"))]
    pub subreddit: Option<String>,

    /// Comma separated terms; keeps posts whose content mentions any of them.
    #[validate(length(max = 200, message = "Search cannot be longer than 200 characters"))]
    pub search: Option<String>,

    pub seed: Option<u64>,
    pub sort: Option<String>,

    #[validate(custom = "validate_reddit_sort")]
    pub reddit_sort: Option<String>,

    #[validate(custom = "validate_time_window")]
    pub time_window: Option<String>,

    #[validate(custom = "validate_date_posted")]
    pub date_posted: Option<String>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(value.trim())) {
        Ok(())
    } else {
        Err(ValidationError::new(code))
    }
}

fn validate_reddit_sort(value: &str) -> Result<(), ValidationError> {
    one_of(value, &REDDIT_SORTS, "Unknown reddit_sort")
}

fn validate_time_window(value: &str) -> Result<(), ValidationError> {
    one_of(value, &TIME_WINDOWS, "Unknown time_window")
}

fn validate_date_posted(value: &str) -> Result<(), ValidationError> {
    one_of(value, &DATE_POSTED, "Unknown date_posted")
}

impl DashboardQuery {
    pub fn into_request(
        self,
        defaults: &DashboardConfig,
        as_of: DateTime<Utc>
    ) -> Result<DashboardRequest, HttpError> {
        self.validate()?;

        let platforms = match &self.platforms {
            None => {
                return Err(FilterError::EmptySelection.into());
            }
            Some(raw) => parse_platforms(raw)?,
        };

        let start = match &self.start {
            Some(raw) => parse_bound(raw, false)?,
            None => DateTime::<Utc>::MIN_UTC,
        };
        let end = match &self.end {
            Some(raw) => parse_bound(raw, true)?,
            None => DateTime::<Utc>::MAX_UTC,
        };

        let mut criteria = FilterCriteria::new(
            platforms,
            start,
            end,
            self.min_engagement.unwrap_or(0)
        )?;
        if let Some(search) = &self.search {
            criteria = criteria.with_search(search);
        }

        let mode = match &self.source {
            Some(raw) =>
                raw
                    .parse::<SourceMode>()
                    .map_err(|v| HttpError::bad_request(ErrorMessage::InvalidSourceMode(v).to_string()))?,
            None => SourceMode::default(),
        };
        let sort = match &self.sort {
            Some(raw) =>
                raw
                    .parse::<SortOrder>()
                    .map_err(|v| HttpError::bad_request(ErrorMessage::InvalidSortOrder(v).to_string()))?,
            None => SortOrder::default(),
        };

        let query = SourceQuery {
            keyword: non_blank(self.keyword),
            subreddit: non_blank(self.subreddit),
            start_date: self.start.as_ref().map(|_| start.date_naive()),
            sort: non_blank(self.reddit_sort).map(|v| v.to_uppercase()),
            time_window: non_blank(self.time_window).map(|v| v.to_uppercase()),
            date_posted: non_blank(self.date_posted).map(|v| v.to_lowercase()),
            limit: self.limit.unwrap_or(0),
        };

        Ok(DashboardRequest {
            criteria,
            top_k: self.top_k.unwrap_or(defaults.default_top_k),
            mode,
            query,
            seed: self.seed,
            sort,
            as_of,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Comma separated, case-insensitive. An all-blank list yields no platforms.
pub fn parse_platforms(raw: &str) -> Result<Vec<Platform>, HttpError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Platform>().map_err(|e|
                HttpError::bad_request(ErrorMessage::InvalidPlatform(e.0).to_string())
            )
        })
        .collect()
}

/// RFC 3339 instant, or a bare `YYYY-MM-DD` expanded to the start or the
/// last instant of that day.
pub fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, HttpError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let invalid = || HttpError::bad_request(ErrorMessage::InvalidDate(raw.to_string()).to_string());

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    naive.map(|n| Utc.from_utc_datetime(&n)).ok_or_else(invalid)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub total_engagement: u64,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            total_engagement: post.total_engagement(),
            post,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub total_posts: usize,
    pub total_engagement: u64,
    pub mean_engagement: f64,
    pub max_engagement: u64,
    pub counts: BTreeMap<Platform, usize>,
    pub totals: BTreeMap<Platform, u64>,
    pub means: BTreeMap<Platform, f64>,
    pub unique_authors: usize,
    pub posts_by_day: BTreeMap<NaiveDate, usize>,
    pub top_posts: Vec<PostResponse>,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            total_posts: summary.total_posts,
            total_engagement: summary.total_engagement,
            mean_engagement: summary.mean_engagement,
            max_engagement: summary.max_engagement,
            counts: summary.counts,
            totals: summary.totals,
            means: summary.means,
            unique_authors: summary.unique_authors,
            posts_by_day: summary.posts_by_day,
            top_posts: summary.top_posts.into_iter().map(PostResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub posts: Vec<PostResponse>,
    pub summary: SummaryResponse,
    pub skipped_records: usize,
    pub duplicate_records: usize,
    pub fallback_platforms: Vec<Platform>,
}

impl From<DashboardResult> for DashboardResponse {
    fn from(result: DashboardResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostResponse::from).collect(),
            summary: result.summary.into(),
            skipped_records: result.skipped_records,
            duplicate_records: result.duplicate_records,
            fallback_platforms: result.fallback_platforms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvalidateQuery {
    /// Absent means every platform.
    pub platform: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub platform: Option<Platform>,
    pub invalidated: usize,
}
