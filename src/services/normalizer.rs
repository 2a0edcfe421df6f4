//! Record normalization: one raw per-platform record in, one `Post` out.
//!
//! Engagement counts missing from the source default to zero. Timestamps and
//! the platform tag are mandatory; a record without them is rejected with
//! `MalformedRecord` and the rest of the batch carries on.

use std::collections::HashMap;

use chrono::{ DateTime, TimeZone, Utc };
use serde::{ Deserialize, Serialize };
use serde_json::Value;
use tracing::{ debug, warn };

use crate::{
    errors::MalformedRecord,
    models::{
        raw::{ LinkedInRecord, RedditRecord, TwitterRecord },
        Engagement,
        Platform,
        Post,
        RawRecord,
    },
};

const UNKNOWN_AUTHOR: &str = "Unknown";
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const REDDIT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Posts that survived normalization plus how many records were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    pub posts: Vec<Post>,
    pub skipped: usize,
    /// Posts collapsed into an earlier copy with the same content.
    #[serde(default)]
    pub duplicates: usize,
}

impl NormalizedBatch {
    /// Apply `dedupe_by_content` and record how many posts it removed.
    pub fn dedupe(mut self) -> Self {
        let (posts, removed) = dedupe_by_content(self.posts);
        self.posts = posts;
        self.duplicates += removed;
        self
    }
}

pub fn normalize(record: RawRecord) -> Result<Post, MalformedRecord> {
    match record {
        RawRecord::LinkedIn(r) => normalize_linkedin(r),
        RawRecord::Reddit(r) => normalize_reddit(r),
        RawRecord::Twitter(r) => normalize_twitter(r),
    }
}

/// Normalize an untyped field map coming from a source adapter.
pub fn normalize_value(tag: &str, value: Value) -> Result<Post, MalformedRecord> {
    RawRecord::from_value(tag, value).and_then(normalize)
}

/// Normalize every record from one source, isolating per-record failures.
pub fn normalize_batch(tag: &str, records: Vec<Value>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for value in records {
        match normalize_value(tag, value) {
            Ok(post) => batch.posts.push(post),
            Err(e) => {
                warn!("Skipping record: {}", e);
                batch.skipped += 1;
            }
        }
    }

    debug!("Normalized {} {} records, skipped {}", batch.posts.len(), tag, batch.skipped);
    batch
}

/// Collapse posts with identical content, keeping the highest-engagement copy
/// at the position of the first occurrence. Posts without text are never
/// merged. Returns the kept posts and how many were removed.
pub fn dedupe_by_content(posts: Vec<Post>) -> (Vec<Post>, usize) {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Post> = Vec::with_capacity(posts.len());
    let mut removed = 0;

    for post in posts {
        let key = post.content.trim().to_string();
        if key.is_empty() {
            kept.push(post);
            continue;
        }
        match slots.get(&key) {
            Some(&idx) => {
                removed += 1;
                if post.total_engagement() > kept[idx].total_engagement() {
                    kept[idx] = post;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(post);
            }
        }
    }

    (kept, removed)
}

fn overflow(platform: Platform) -> MalformedRecord {
    MalformedRecord::new(platform.as_str(), "engagement overflow")
}

fn count(platform: Platform, field: &str, value: Option<i64>) -> Result<u64, MalformedRecord> {
    match value {
        None => Ok(0),
        Some(n) if n < 0 =>
            Err(MalformedRecord::new(platform.as_str(), format!("negative {}: {}", field, n))),
        Some(n) => Ok(n as u64),
    }
}

/// The total must fit too, so downstream sums over one post never overflow.
fn checked_engagement(
    platform: Platform,
    likes: u64,
    comments: u64,
    shares: u64
) -> Result<Engagement, MalformedRecord> {
    let engagement = Engagement::new(likes, comments, shares);
    engagement.checked_total().ok_or_else(|| overflow(platform))?;
    Ok(engagement)
}

fn normalize_linkedin(record: LinkedInRecord) -> Result<Post, MalformedRecord> {
    let platform = Platform::LinkedIn;

    let millis = record.posted_date_timestamp.ok_or_else(||
        MalformedRecord::new(platform.as_str(), "missing postedDateTimestamp")
    )?;
    let timestamp = Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(||
            MalformedRecord::new(platform.as_str(), format!("timestamp out of range: {}", millis))
        )?;

    let stats = record.social_activity.unwrap_or_default();
    let reactions = [
        ("likeCount", stats.like_count),
        ("appreciationCount", stats.appreciation_count),
        ("empathyCount", stats.empathy_count),
        ("InterestCount", stats.interest_count),
        ("praiseCount", stats.praise_count),
        ("funnyCount", stats.funny_count),
        ("maybeCount", stats.maybe_count),
    ];
    let mut likes: u64 = 0;
    for (field, value) in reactions {
        likes = likes.checked_add(count(platform, field, value)?).ok_or_else(|| overflow(platform))?;
    }

    let engagement = checked_engagement(
        platform,
        likes,
        count(platform, "numComments", stats.num_comments)?,
        count(platform, "numShares", stats.num_shares)?
    )?;

    let author = record.author
        .and_then(|a| a.full_name)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let id = record.urn.unwrap_or_else(|| fallback_id(platform, &author, &timestamp));

    Ok(Post {
        id,
        platform,
        author,
        timestamp,
        content: record.text.unwrap_or_default(),
        url: record.url.filter(|u| !u.is_empty()),
        community: None,
        engagement,
    })
}

fn normalize_twitter(record: TwitterRecord) -> Result<Post, MalformedRecord> {
    let platform = Platform::Twitter;

    let raw_date = record.creation_date.ok_or_else(||
        MalformedRecord::new(platform.as_str(), "missing creation_date")
    )?;
    let timestamp = DateTime::parse_from_str(&raw_date, TWITTER_DATE_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e|
            MalformedRecord::new(platform.as_str(), format!("bad creation_date '{}': {}", raw_date, e))
        )?;

    let shares = count(platform, "retweet_count", record.retweet_count)?
        .checked_add(count(platform, "quote_count", record.quote_count)?)
        .ok_or_else(|| overflow(platform))?;
    let engagement = checked_engagement(
        platform,
        count(platform, "favorite_count", record.favorite_count)?,
        count(platform, "reply_count", record.reply_count)?,
        shares
    )?;

    let author = record.user
        .and_then(|u| u.username)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let url = record.tweet_id
        .as_ref()
        .map(|id| format!("https://twitter.com/{}/status/{}", author, id));
    let id = record.tweet_id.unwrap_or_else(|| fallback_id(platform, &author, &timestamp));

    Ok(Post {
        id,
        platform,
        author,
        timestamp,
        content: record.text.unwrap_or_default(),
        url,
        community: None,
        engagement,
    })
}

fn normalize_reddit(record: RedditRecord) -> Result<Post, MalformedRecord> {
    let platform = Platform::Reddit;

    let raw_date = record.creation_date.ok_or_else(||
        MalformedRecord::new(platform.as_str(), "missing creationDate")
    )?;
    let timestamp = DateTime::parse_from_rfc3339(&raw_date)
        .or_else(|_| DateTime::parse_from_str(&raw_date, REDDIT_DATE_FORMAT))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e|
            MalformedRecord::new(platform.as_str(), format!("bad creationDate '{}': {}", raw_date, e))
        )?;

    let engagement = checked_engagement(
        platform,
        count(platform, "score", record.score)?,
        count(platform, "comments", record.comments)?,
        count(platform, "shares", record.shares)?
    )?;

    let title = record.title.unwrap_or_default();
    let body = record.content.and_then(|c| c.text).filter(|t| !t.is_empty());
    let content = match body {
        Some(text) if !title.is_empty() => format!("{}\n\n{}", title, text),
        Some(text) => text,
        None => title,
    };

    let author = record.author
        .and_then(|a| a.name)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let id = record.id.unwrap_or_else(|| fallback_id(platform, &author, &timestamp));

    Ok(Post {
        id,
        platform,
        author,
        timestamp,
        content,
        url: record.url.filter(|u| !u.is_empty()),
        community: record.subreddit.and_then(|s| s.name),
        engagement,
    })
}

fn fallback_id(platform: Platform, author: &str, timestamp: &DateTime<Utc>) -> String {
    format!("{}:{}:{}", platform.slug(), author, timestamp.timestamp_millis())
}
