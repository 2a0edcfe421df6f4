use std::{ fmt, str::FromStr };

use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

use crate::errors::ParsePlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    Reddit,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Reddit, Platform::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Reddit => "Reddit",
            Platform::Twitter => "Twitter",
        }
    }

    /// Lowercase form used in cache keys and query strings.
    pub fn slug(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Reddit => "reddit",
            Platform::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "reddit" => Ok(Platform::Reddit),
            "twitter" | "x" => Ok(Platform::Twitter),
            _ => Err(ParsePlatformError(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl Engagement {
    pub fn new(likes: u64, comments: u64, shares: u64) -> Self {
        Self { likes, comments, shares }
    }

    /// Sum of all counts, or `None` if it does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        self.likes.checked_add(self.comments)?.checked_add(self.shares)
    }

    /// Saturates at `u64::MAX`. Normalized posts never get there.
    pub fn total(&self) -> u64 {
        self.likes.saturating_add(self.comments).saturating_add(self.shares)
    }
}

/// A social-media item normalized into the shape shared by every platform.
///
/// Built once per raw record by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub platform: Platform,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub url: Option<String>,
    /// Subreddit for Reddit posts.
    pub community: Option<String>,
    pub engagement: Engagement,
}

impl Post {
    pub fn total_engagement(&self) -> u64 {
        self.engagement.total()
    }
}
