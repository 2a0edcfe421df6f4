//! Producers of raw per-platform records.
//!
//! A source only fetches; turning records into `Post`s is the normalizer's job.
//! Retrying lives here on the caller side so the core stays pure.

pub mod mock;
pub mod rapidapi;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::{ errors::SourceError, models::Platform };

pub use mock::MockSource;
pub use rapidapi::RapidApiSource;

lazy_static! {
    static ref SUBREDDIT_URL: Regex = Regex::new(r"reddit\.com/r/([A-Za-z0-9_]+)").unwrap();
    static ref SUBREDDIT_NAME: Regex = Regex::new(r"^(?:/?r/|@)?([A-Za-z0-9_]+)/?$").unwrap();
}

/// Search parameters forwarded to a source. Sources ignore what they do not use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceQuery {
    pub keyword: Option<String>,
    /// Reddit: browse this subreddit instead of searching site-wide.
    pub subreddit: Option<String>,
    /// Twitter: only tweets posted on or after this date.
    pub start_date: Option<NaiveDate>,
    /// Reddit: `RELEVANCE`, `TOP`, `NEW`, `HOT`, ...
    pub sort: Option<String>,
    /// Reddit: `ALL`, `YEAR`, `MONTH`, ...
    pub time_window: Option<String>,
    /// LinkedIn: `past-24h`, `past-week`, `past-month`.
    pub date_posted: Option<String>,
    pub limit: usize,
}

impl SourceQuery {
    /// Stable, order-independent rendering used as part of a cache key.
    pub fn cache_fragment(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let fields = [
            ("keyword", self.keyword.as_deref().map(str::to_lowercase)),
            ("subreddit", self.subreddit.as_deref().map(str::to_lowercase)),
            ("start", self.start_date.map(|d| d.to_string())),
            ("sort", self.sort.clone()),
            ("time", self.time_window.clone()),
            ("posted", self.date_posted.clone()),
            ("limit", Some(self.limit.to_string())),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                serializer.append_pair(name, &value);
            }
        }
        serializer.finish()
    }
}

/// Accepts `nhs`, `r/nhs`, `@nhs` or a full `https://www.reddit.com/r/nhs/` URL.
pub fn clean_subreddit(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if let Some(caps) = SUBREDDIT_URL.captures(trimmed) {
        return Some(caps[1].to_string());
    }
    SUBREDDIT_NAME.captures(trimmed).map(|caps| caps[1].to_string())
}

#[async_trait]
pub trait PostSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Value>, SourceError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Exponential: base, 2 * base, 4 * base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(factor)
    }
}

/// Fetch from `source`, retrying transient failures with exponential backoff.
///
/// The read is idempotent, so repeating it is always safe.
pub async fn fetch_with_retry(
    source: &dyn PostSource,
    query: &SourceQuery,
    policy: &RetryPolicy
) -> Result<Vec<Value>, SourceError> {
    let mut attempt = 1;
    loop {
        match source.fetch(query).await {
            Ok(records) => {
                return Ok(records);
            }
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} fetch attempt {}/{} failed: {}; retrying in {:?}",
                    source.platform(),
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicU32, Ordering };
    use serde_json::json;

    struct FlakySource {
        calls: AtomicU32,
        failures: u32,
        status: u16,
    }

    #[async_trait]
    impl PostSource for FlakySource {
        fn platform(&self) -> Platform {
            Platform::Reddit
        }

        async fn fetch(&self, _query: &SourceQuery) -> Result<Vec<Value>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(SourceError::Status { platform: "Reddit".into(), status: self.status })
            } else {
                Ok(vec![json!({ "id": call })])
            }
        }
    }

    fn flaky(failures: u32, status: u16) -> FlakySource {
        FlakySource { calls: AtomicU32::new(0), failures, status }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let source = flaky(2, 503);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let records = fetch_with_retry(&source, &SourceQuery::default(), &policy).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let source = flaky(5, 503);
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let err = fetch_with_retry(&source, &SourceQuery::default(), &policy).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let source = flaky(1, 403);
        let policy = RetryPolicy::new(5, Duration::ZERO);

        assert!(fetch_with_retry(&source, &SourceQuery::default(), &policy).await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn cleans_subreddit_inputs() {
        assert_eq!(clean_subreddit("nhs").as_deref(), Some("nhs"));
        assert_eq!(clean_subreddit(" r/nhs ").as_deref(), Some("nhs"));
        assert_eq!(clean_subreddit("@doctors").as_deref(), Some("doctors"));
        assert_eq!(
            clean_subreddit("https://www.reddit.com/r/medicine/comments/xyz").as_deref(),
            Some("medicine")
        );
        assert_eq!(clean_subreddit("not a subreddit!"), None);
    }

    #[test]
    fn cache_fragment_ignores_keyword_case() {
        let a = SourceQuery { keyword: Some("NHS Pathway".into()), limit: 50, ..Default::default() };
        let b = SourceQuery { keyword: Some("nhs pathway".into()), limit: 50, ..Default::default() };
        assert_eq!(a.cache_fragment(), b.cache_fragment());
        assert_eq!(a.cache_fragment(), "keyword=nhs+pathway&limit=50");
    }
}
