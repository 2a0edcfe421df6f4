//! One filter-and-render cycle: fetch (or reuse) per-platform batches,
//! normalize, filter, optionally rank, aggregate.

use std::{ collections::HashMap, fmt, str::FromStr, sync::Arc };

use chrono::{ DateTime, Utc };
use serde_json::Value;
use tracing::{ info, warn };

use crate::{
    config::{ Config, DashboardConfig },
    errors::{ DashboardError, SourceError },
    models::{ Platform, Post },
    services::{
        aggregator::{ aggregate, rank_by_engagement, Summary },
        cache_services::QueryCache,
        filter_engine::{ filter_posts, FilterCriteria },
        normalizer::{ normalize_batch, NormalizedBatch },
        sources::{ fetch_with_retry, MockSource, PostSource, RapidApiSource, RetryPolicy, SourceQuery },
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceMode {
    #[default]
    Mock,
    Live,
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Mock => write!(f, "mock"),
            SourceMode::Live => write!(f, "live"),
        }
    }
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(SourceMode::Mock),
            "live" => Ok(SourceMode::Live),
            _ => Err(s.to_string()),
        }
    }
}

/// `Input` keeps the filter's stable order; `Engagement` ranks like top-K.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Input,
    Engagement,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(SortOrder::Input),
            "engagement" => Ok(SortOrder::Engagement),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub criteria: FilterCriteria,
    pub top_k: usize,
    pub mode: SourceMode,
    pub query: SourceQuery,
    /// Overrides the configured mock seed for this request.
    pub seed: Option<u64>,
    pub sort: SortOrder,
    /// Reference time for cache buckets. Mock timestamps are anchored to the
    /// start of its bucket.
    pub as_of: DateTime<Utc>,
}

impl DashboardRequest {
    pub fn new(criteria: FilterCriteria, top_k: usize) -> Self {
        Self {
            criteria,
            top_k,
            mode: SourceMode::default(),
            query: SourceQuery::default(),
            seed: None,
            sort: SortOrder::default(),
            as_of: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardResult {
    pub posts: Vec<Post>,
    pub summary: Summary,
    pub skipped_records: usize,
    /// Posts dropped because an earlier post had the same content.
    pub duplicate_records: usize,
    /// Platforms served from mock data because the live source let us down.
    pub fallback_platforms: Vec<Platform>,
}

struct Loaded {
    batch: NormalizedBatch,
    fallback: bool,
}

pub struct DashboardService {
    live: HashMap<Platform, Arc<dyn PostSource>>,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
    settings: DashboardConfig,
}

impl DashboardService {
    pub fn new(
        live: HashMap<Platform, Arc<dyn PostSource>>,
        cache: Arc<QueryCache>,
        retry: RetryPolicy,
        settings: DashboardConfig
    ) -> Self {
        Self { live, cache, retry, settings }
    }

    /// Wire up RapidAPI sources for every platform when a key is configured.
    pub fn from_config(config: &Config, cache: Arc<QueryCache>) -> Self {
        let mut live: HashMap<Platform, Arc<dyn PostSource>> = HashMap::new();

        if config.sources.live_enabled() {
            for platform in Platform::ALL {
                match RapidApiSource::new(platform, &config.sources) {
                    Ok(source) => {
                        live.insert(platform, Arc::new(source));
                    }
                    Err(e) => warn!("Live {} source unavailable: {}", platform, e),
                }
            }
        } else {
            info!("RAPIDAPI_KEY not set, live requests will use mock data");
        }

        let retry = RetryPolicy::new(config.sources.max_attempts, config.sources.backoff());
        Self::new(live, cache, retry, config.dashboard.clone())
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn settings(&self) -> &DashboardConfig {
        &self.settings
    }

    pub async fn run(&self, request: &DashboardRequest) -> Result<DashboardResult, DashboardError> {
        request.criteria.validate()?;

        let mut posts = Vec::new();
        let mut skipped_records = 0;
        let mut duplicate_records = 0;
        let mut fallback_platforms = Vec::new();

        for platform in &request.criteria.platforms {
            let loaded = self.load_platform(*platform, request).await?;
            skipped_records += loaded.batch.skipped;
            duplicate_records += loaded.batch.duplicates;
            if loaded.fallback {
                fallback_platforms.push(*platform);
            }
            posts.extend(loaded.batch.posts);
        }

        let mut filtered = filter_posts(&posts, &request.criteria)?;
        if request.sort == SortOrder::Engagement {
            filtered = rank_by_engagement(&filtered);
        }
        let summary = aggregate(&filtered, request.top_k);

        info!(
            "Dashboard cycle: {} fetched, {} matched, {} skipped, {} duplicates, fallback on {:?}",
            posts.len(),
            filtered.len(),
            skipped_records,
            duplicate_records,
            fallback_platforms
        );

        Ok(DashboardResult {
            posts: filtered,
            summary,
            skipped_records,
            duplicate_records,
            fallback_platforms,
        })
    }

    async fn load_platform(
        &self,
        platform: Platform,
        request: &DashboardRequest
    ) -> Result<Loaded, SourceError> {
        let seed = request.seed.or(self.settings.mock_seed);
        let params = format!(
            "{}&source={}&seed={}",
            request.query.cache_fragment(),
            request.mode,
            seed.map(|s| s.to_string()).unwrap_or_default()
        );
        let key = self.cache.key(platform, params, request.as_of);

        if let Some(batch) = self.cache.get(&key).await {
            return Ok(Loaded { batch, fallback: false });
        }

        let (records, fallback) = match request.mode {
            SourceMode::Mock => (self.mock_records(platform, seed, request), false),
            SourceMode::Live => self.live_records(platform, seed, request).await?,
        };

        let batch = normalize_batch(platform.as_str(), records).dedupe();

        // Fallback data stands in for a failure; the next request should try live again.
        if !fallback {
            self.cache.put(key, batch.clone()).await;
        }

        Ok(Loaded { batch, fallback })
    }

    async fn live_records(
        &self,
        platform: Platform,
        seed: Option<u64>,
        request: &DashboardRequest
    ) -> Result<(Vec<Value>, bool), SourceError> {
        let Some(source) = self.live.get(&platform) else {
            if self.settings.fallback_to_mock {
                return Ok((self.mock_records(platform, seed, request), true));
            }
            return Err(SourceError::MissingCredentials);
        };

        match fetch_with_retry(source.as_ref(), &request.query, &self.retry).await {
            Ok(records) if !records.is_empty() => Ok((records, false)),
            Ok(records) if !self.settings.fallback_to_mock => Ok((records, false)),
            Ok(_) => {
                info!("No live {} records, falling back to mock data", platform);
                Ok((self.mock_records(platform, seed, request), true))
            }
            Err(e) if self.settings.fallback_to_mock => {
                warn!("Live {} fetch failed ({}), falling back to mock data", platform, e);
                Ok((self.mock_records(platform, seed, request), true))
            }
            Err(e) => Err(e),
        }
    }

    fn mock_records(
        &self,
        platform: Platform,
        seed: Option<u64>,
        request: &DashboardRequest
    ) -> Vec<Value> {
        MockSource::new(
            platform,
            self.settings.mock_posts_per_platform,
            seed,
            self.cache.bucket_start(request.as_of)
        ).generate(&request.query)
    }
}
