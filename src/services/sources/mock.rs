use async_trait::async_trait;
use chrono::{ DateTime, Duration, Utc };
use rand::{ rngs::StdRng, Rng, SeedableRng };
use serde_json::{ json, Value };
use uuid::Uuid;

use crate::{ errors::SourceError, models::Platform };

use super::{ PostSource, SourceQuery };

const TOPICS: [&str; 10] = [
    "Our new diabetes pathway cut referral times by a third",
    "Cardio rehab uptake is still far too low in primary care",
    "Sharing the slides from today's NHS pathway redesign workshop",
    "Remote monitoring for heart failure patients: lessons learned",
    "How are other practices handling the HbA1c backlog?",
    "Prescribing data shows SGLT2 inhibitor use doubling",
    "Integrated care boards need clinicians in the room",
    "Patient education leaflets that actually get read",
    "Waiting list validation freed up 200 appointments this month",
    "What does good look like for a cardiometabolic clinic?",
];

const AUTHORS: [&str; 8] = [
    "Dr. Amira Patel",
    "Tom Whitfield",
    "Nurse Practitioner Jo",
    "Dr. Kwame Mensah",
    "Sarah Lindqvist",
    "GP Registrar Ali",
    "Helen Okafor",
    "Pharmacist Dan",
];

const SUBREDDITS: [&str; 4] = ["nhs", "medicine", "diabetes", "cardiology"];

const WINDOW_DAYS: i64 = 30;

/// Synthetic records in each platform's native wire shape.
///
/// With a seed the output is a pure function of (seed, platform, query,
/// anchor); without one the generator draws from OS entropy.
#[derive(Debug, Clone)]
pub struct MockSource {
    platform: Platform,
    count: usize,
    seed: Option<u64>,
    anchor: DateTime<Utc>,
}

impl MockSource {
    pub fn new(platform: Platform, count: usize, seed: Option<u64>, anchor: DateTime<Utc>) -> Self {
        Self {
            platform,
            count,
            seed,
            anchor,
        }
    }

    pub fn generate(&self, query: &SourceQuery) -> Vec<Value> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ platform_salt(self.platform)),
            None => StdRng::from_os_rng(),
        };

        let count = if query.limit > 0 { self.count.min(query.limit) } else { self.count };
        (0..count).map(|index| self.record(&mut rng, query, index)).collect()
    }

    /// `index` numbers the post so no two records in a batch share content.
    fn record(&self, rng: &mut StdRng, query: &SourceQuery, index: usize) -> Value {
        let topic = TOPICS[rng.random_range(0..TOPICS.len())];
        let topic = format!("{} (update {})", topic, index + 1);
        let content = match &query.keyword {
            Some(keyword) => format!("{} #{}", topic, keyword.replace(' ', "")),
            None => topic,
        };
        let author = AUTHORS[rng.random_range(0..AUTHORS.len())];
        let timestamp =
            self.anchor - Duration::seconds(rng.random_range(0..WINDOW_DAYS * 24 * 3600));
        let id = Uuid::from_u128(rng.random::<u128>()).simple().to_string();
        // Roughly one record in five leaves out its share counts.
        let sparse = rng.random_range(0..5) == 0;

        match self.platform {
            Platform::LinkedIn => {
                let mut stats =
                    json!({
                    "likeCount": rng.random_range(0..400),
                    "empathyCount": rng.random_range(0..40),
                    "InterestCount": rng.random_range(0..20),
                    "numComments": rng.random_range(0..80),
                });
                if !sparse {
                    stats["numShares"] = json!(rng.random_range(0..30));
                }
                json!({
                    "urn": format!("urn:li:activity:{}", id),
                    "url": format!("https://www.linkedin.com/feed/update/urn:li:activity:{}", id),
                    "text": content,
                    "postedDateTimestamp": timestamp.timestamp_millis(),
                    "author": { "fullName": author },
                    "socialActivityCountsInsight": stats,
                })
            }
            Platform::Twitter => {
                let handle = author.to_lowercase().replace([' ', '.'], "_");
                let mut tweet =
                    json!({
                    "tweet_id": id,
                    "text": content,
                    "creation_date": timestamp.format("%a %b %d %H:%M:%S %z %Y").to_string(),
                    "user": { "username": handle },
                    "favorite_count": rng.random_range(0..500),
                    "reply_count": rng.random_range(0..60),
                });
                if !sparse {
                    tweet["retweet_count"] = json!(rng.random_range(0..120));
                    tweet["quote_count"] = json!(rng.random_range(0..15));
                }
                tweet
            }
            Platform::Reddit => {
                let subreddit = query.subreddit
                    .clone()
                    .unwrap_or_else(|| SUBREDDITS[rng.random_range(0..SUBREDDITS.len())].to_string());
                json!({
                    "id": format!("t3_{}", &id[..8]),
                    "url": format!("https://www.reddit.com/r/{}/comments/{}/", subreddit, &id[..8]),
                    "title": content,
                    "creationDate": timestamp.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
                    "author": { "name": author.to_lowercase().replace([' ', '.'], "") },
                    "subreddit": { "name": subreddit },
                    "score": rng.random_range(0..900),
                    "comments": rng.random_range(0..150),
                })
            }
        }
    }
}

fn platform_salt(platform: Platform) -> u64 {
    match platform {
        Platform::LinkedIn => 0x4c49_4e4b,
        Platform::Reddit => 0x5245_4444,
        Platform::Twitter => 0x5457_4954,
    }
}

#[async_trait]
impl PostSource for MockSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Value>, SourceError> {
        Ok(self.generate(query))
    }
}
