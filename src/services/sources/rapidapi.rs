use async_trait::async_trait;
use reqwest::{ Client, RequestBuilder };
use serde_json::{ json, Value };
use tracing::{ debug, info };

use crate::{ config::SourcesConfig, errors::SourceError, models::Platform };

use super::{ clean_subreddit, PostSource, SourceQuery };

/// LinkedIn author-industry codes for health and care sectors; searches are
/// restricted to posts by people in these industries.
pub const HEALTHCARE_INDUSTRY_CODES: [u32; 21] = [
    14, // Hospitals and Health Care
    2115, // Community Services
    2112, // Services for the Elderly and Disabled
    2081, // Hospitals
    88, // Individual and Family Services
    2128, // Child Day Care Services
    2122, // Emergency and Relief Services
    2125, // Vocational Rehabilitation Services
    13, // Medical Practices
    125, // Alternative Medicine
    2077, // Ambulance Services
    2048, // Chiropractors
    2045, // Dentists
    2060, // Family Planning Centers
    2074, // Home Health Care Services
    2069, // Medical and Diagnostic Laboratories
    139, // Mental Health Care
    2050, // Optometrists
    2063, // Outpatient Care Centers
    2054, // Physical, Occupational and Speech Therapists
    2040, // Physicians
];

const DEFAULT_KEYWORD: &str = "nhs pathway";
const DEFAULT_LIMIT: usize = 50;

/// Live search against the RapidAPI-hosted LinkedIn, Twitter and Reddit scrapers.
pub struct RapidApiSource {
    platform: Platform,
    host: String,
    api_key: String,
    client: Client,
}

impl RapidApiSource {
    pub fn new(platform: Platform, config: &SourcesConfig) -> Result<Self, SourceError> {
        let api_key = config.rapidapi_key.clone().ok_or(SourceError::MissingCredentials)?;

        let host = match platform {
            Platform::LinkedIn => config.linkedin_host.clone(),
            Platform::Twitter => config.twitter_host.clone(),
            Platform::Reddit => config.reddit_host.clone(),
        };

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            platform,
            host,
            api_key,
            client,
        })
    }

    fn request(&self, query: &SourceQuery) -> RequestBuilder {
        let keyword = query.keyword.as_deref().unwrap_or(DEFAULT_KEYWORD);
        let limit = if query.limit > 0 { query.limit } else { DEFAULT_LIMIT };

        let builder = match self.platform {
            Platform::LinkedIn => {
                let payload =
                    json!({
                    "keyword": keyword,
                    "sortBy": "relevance",
                    "datePosted": query.date_posted.as_deref().unwrap_or(""),
                    "page": 1,
                    "contentType": "",
                    "authorIndustry": HEALTHCARE_INDUSTRY_CODES,
                });
                self.client.post(format!("https://{}/search-posts", self.host)).json(&payload)
            }
            Platform::Twitter => {
                let mut params = vec![
                    ("query", keyword.to_string()),
                    ("section", "top".to_string()),
                    ("min_retweets", "0".to_string()),
                    ("min_likes", "1".to_string()),
                    ("limit", limit.to_string()),
                    ("language", "en".to_string())
                ];
                if let Some(start) = query.start_date {
                    params.push(("start_date", start.format("%Y-%m-%d").to_string()));
                }
                self.client.get(format!("https://{}/search/search", self.host)).query(&params)
            }
            Platform::Reddit => {
                let time = query.time_window.as_deref().unwrap_or("ALL").to_uppercase();
                match query.subreddit.as_deref().and_then(clean_subreddit) {
                    Some(subreddit) => {
                        let mut params = vec![
                            ("sub", format!("https://www.reddit.com/r/{}/", subreddit)),
                            ("sort", query.sort.as_deref().unwrap_or("HOT").to_uppercase()),
                            ("time", time)
                        ];
                        if let Some(keyword) = &query.keyword {
                            params.push(("query", keyword.clone()));
                        }
                        self.client
                            .get(format!("https://{}/sub_posts_v3", self.host))
                            .query(&params)
                    }
                    None => {
                        let params = [
                            ("query", keyword.to_string()),
                            ("sort", query.sort.as_deref().unwrap_or("RELEVANCE").to_uppercase()),
                            ("time", time),
                            ("nsfw", "0".to_string()),
                        ];
                        self.client
                            .get(format!("https://{}/search_posts_v3", self.host))
                            .query(&params)
                    }
                }
            }
        };

        builder.header("x-rapidapi-key", &self.api_key).header("x-rapidapi-host", &self.host)
    }
}

#[async_trait]
impl PostSource for RapidApiSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Value>, SourceError> {
        debug!("Fetching {} posts from {}", self.platform, self.host);

        let response = self.request(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                platform: self.platform.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        let records = parse_envelope(self.platform, body)?;
        info!("Retrieved {} {} records", records.len(), self.platform);
        Ok(records)
    }
}

/// Pull the record list out of a platform's response envelope.
pub fn parse_envelope(platform: Platform, mut body: Value) -> Result<Vec<Value>, SourceError> {
    let unexpected = |reason: &str| SourceError::UnexpectedPayload {
        platform: platform.to_string(),
        reason: reason.to_string(),
    };

    let items = match platform {
        Platform::LinkedIn => {
            if body["success"].as_bool() != Some(true) {
                return Err(unexpected("success flag not set"));
            }
            if body["data"]["count"].as_i64().is_some_and(|count| count <= 0) {
                return Ok(Vec::new());
            }
            body.pointer_mut("/data/items").map(Value::take)
        }
        Platform::Twitter => body.get_mut("results").map(Value::take),
        Platform::Reddit => body.get_mut("data").map(Value::take),
    };

    match items {
        Some(Value::Array(records)) => Ok(records),
        None | Some(Value::Null) => Err(unexpected("record list missing")),
        Some(_) => Err(unexpected("record list is not an array")),
    }
}
