// Per-platform raw record shapes as returned by the upstream search APIs.

use serde::{ Deserialize, Serialize };
use serde_json::Value;

use crate::{ errors::MalformedRecord, models::Platform };

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInRecord {
    #[serde(default)]
    pub urn: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub posted_date_timestamp: Option<i64>,
    #[serde(default)]
    pub author: Option<LinkedInAuthor>,
    #[serde(default, rename = "socialActivityCountsInsight")]
    pub social_activity: Option<LinkedInSocialActivity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInAuthor {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInSocialActivity {
    #[serde(default)]
    pub num_comments: Option<i64>,
    #[serde(default)]
    pub num_shares: Option<i64>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub appreciation_count: Option<i64>,
    #[serde(default)]
    pub empathy_count: Option<i64>,
    #[serde(default, rename = "InterestCount")]
    pub interest_count: Option<i64>,
    #[serde(default)]
    pub praise_count: Option<i64>,
    #[serde(default)]
    pub funny_count: Option<i64>,
    #[serde(default)]
    pub maybe_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterRecord {
    #[serde(default)]
    pub tweet_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// e.g. `Mon Jan 01 10:00:00 +0000 2024`
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub user: Option<TwitterUser>,
    #[serde(default)]
    pub favorite_count: Option<i64>,
    #[serde(default)]
    pub retweet_count: Option<i64>,
    #[serde(default)]
    pub reply_count: Option<i64>,
    #[serde(default)]
    pub quote_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterUser {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<RedditContent>,
    /// RFC 3339 with fractional seconds.
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub author: Option<RedditName>,
    #[serde(default)]
    pub subreddit: Option<RedditName>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub comments: Option<i64>,
    #[serde(default)]
    pub shares: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditContent {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditName {
    #[serde(default)]
    pub name: Option<String>,
}

/// A raw record tagged with the platform it came from.
#[derive(Debug, Clone)]
pub enum RawRecord {
    LinkedIn(LinkedInRecord),
    Reddit(RedditRecord),
    Twitter(TwitterRecord),
}

impl RawRecord {
    /// Decode a field map into the record shape selected by `tag`.
    ///
    /// Unknown tags and values that do not fit the platform's shape are
    /// rejected as malformed.
    pub fn from_value(tag: &str, value: Value) -> Result<Self, MalformedRecord> {
        let platform: Platform = tag
            .parse()
            .map_err(|e: crate::errors::ParsePlatformError| MalformedRecord::new(tag, e.to_string()))?;

        if !value.is_object() {
            return Err(MalformedRecord::new(platform.as_str(), "record is not an object"));
        }

        let invalid = |e: serde_json::Error| MalformedRecord::new(platform.as_str(), e.to_string());

        match platform {
            Platform::LinkedIn =>
                serde_json::from_value(value).map(RawRecord::LinkedIn).map_err(invalid),
            Platform::Reddit => serde_json::from_value(value).map(RawRecord::Reddit).map_err(invalid),
            Platform::Twitter =>
                serde_json::from_value(value).map(RawRecord::Twitter).map_err(invalid),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            RawRecord::LinkedIn(_) => Platform::LinkedIn,
            RawRecord::Reddit(_) => Platform::Reddit,
            RawRecord::Twitter(_) => Platform::Twitter,
        }
    }
}
