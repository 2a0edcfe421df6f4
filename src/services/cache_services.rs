use std::collections::HashMap;

use chrono::{ DateTime, TimeZone, Utc };
use redis::{ Client, Commands };
use serde::{ Deserialize, Serialize };
use tokio::sync::RwLock;
use tracing::{ debug, error, info };

use crate::{ models::Platform, services::normalizer::NormalizedBatch };

const KEY_PREFIX: &str = "post_pulse";
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// (platform, query parameters, time bucket). A key from an older bucket
/// can never be hit again, which is what expires an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub platform: Platform,
    pub params: String,
    pub bucket: i64,
}

impl CacheKey {
    pub fn new(
        platform: Platform,
        params: impl Into<String>,
        now: DateTime<Utc>,
        bucket_seconds: u64
    ) -> Self {
        Self {
            platform,
            params: params.into(),
            bucket: bucket_for(now, bucket_seconds),
        }
    }

    fn redis_key(&self) -> String {
        format!("{}:posts:{}:{}:{}", KEY_PREFIX, self.platform.slug(), self.bucket, self.params)
    }
}

fn platform_tag(platform: Platform) -> String {
    format!("{}:tag:{}", KEY_PREFIX, platform.slug())
}

pub fn bucket_for(now: DateTime<Utc>, bucket_seconds: u64) -> i64 {
    now.timestamp().div_euclid(bucket_seconds.max(1) as i64)
}

/// First instant of the bucket containing `now`.
pub fn bucket_start(now: DateTime<Utc>, bucket_seconds: u64) -> DateTime<Utc> {
    let width = bucket_seconds.max(1) as i64;
    Utc.timestamp_opt(bucket_for(now, bucket_seconds).saturating_mul(width), 0)
        .single()
        .unwrap_or(now)
}

/// Thin JSON-over-Redis mirror with per-platform tag sets for invalidation.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    ttl_seconds: u64,
}

impl RedisCache {
    pub fn new(client: Client, ttl_seconds: u64) -> Self {
        Self { client, ttl_seconds }
    }

    pub async fn get<T>(&self, key: &str) -> Option<T> where T: for<'de> Deserialize<'de> {
        match self.client.get_connection() {
            Ok(mut conn) => {
                match conn.get::<&str, Option<String>>(key) {
                    Ok(Some(value)) =>
                        match serde_json::from_str::<T>(&value) {
                            Ok(data) => {
                                debug!("Redis hit for key: {}", key);
                                Some(data)
                            }
                            Err(e) => {
                                error!("Failed to deserialize cached value for key {}: {}", key, e);
                                None
                            }
                        }
                    Ok(None) => {
                        debug!("Redis miss for key: {}", key);
                        None
                    }
                    Err(e) => {
                        error!("Failed to read cache key {}: {}", key, e);
                        None
                    }
                }
            }
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                None
            }
        }
    }

    pub async fn set_with_tag<T>(&self, key: &str, value: &T, tag: &str) -> bool where T: Serialize {
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("Failed to serialize value for key {}: {}", key, e);
                return false;
            }
        };

        match self.client.get_connection() {
            Ok(mut conn) => {
                match conn.set_ex::<&str, String, ()>(key, serialized, self.ttl_seconds) {
                    Ok(_) => {
                        let _: Result<(), _> = conn.sadd(tag, key);
                        let _: Result<(), _> = conn.expire(tag, self.ttl_seconds as i64);
                        debug!("Cached value for key: {} with TTL: {}s", key, self.ttl_seconds);
                        true
                    }
                    Err(e) => {
                        error!("Failed to cache value for key {}: {}", key, e);
                        false
                    }
                }
            }
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                false
            }
        }
    }

    /// Delete every key registered under `tag`, then the tag set itself.
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return 0;
            }
        };

        let keys = match conn.smembers::<&str, Vec<String>>(tag) {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to get members for tag {}: {}", tag, e);
                return 0;
            }
        };

        let mut invalidated = 0;
        for key in &keys {
            match conn.del::<&str, i32>(key) {
                Ok(n) if n > 0 => {
                    invalidated += 1;
                }
                Ok(_) => {}
                Err(e) => error!("Failed to delete cache key {}: {}", key, e),
            }
        }
        let _: Result<i32, _> = conn.del(tag);

        invalidated
    }
}

struct Slot {
    batch: NormalizedBatch,
    inserted: u64,
}

/// Bounded in-process map; the oldest insert goes first when full.
#[derive(Default)]
struct MemoryStore {
    entries: HashMap<CacheKey, Slot>,
    next_insert: u64,
}

impl MemoryStore {
    fn insert(&mut self, key: CacheKey, batch: NormalizedBatch, max_entries: usize) {
        let current = key.bucket;
        self.entries.retain(|k, _| k.bucket >= current);

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= max_entries {
                let oldest = self.entries
                    .iter()
                    .min_by_key(|(_, slot)| slot.inserted)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        debug!("Evicting cache entry {:?}", k);
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }

        let inserted = self.next_insert;
        self.next_insert += 1;
        self.entries.insert(key, Slot { batch, inserted });
    }
}

/// Per-platform fetch results, cached by query and time bucket.
///
/// The in-process map is the primary store; writes take the lock
/// exclusively, lookups share it. It holds at most `max_entries` batches.
/// Redis, when configured, mirrors entries so other instances can reuse them.
pub struct QueryCache {
    bucket_seconds: u64,
    max_entries: usize,
    memory: RwLock<MemoryStore>,
    redis: Option<RedisCache>,
}

impl QueryCache {
    pub fn new(bucket_seconds: u64, max_entries: usize, redis: Option<RedisCache>) -> Self {
        Self {
            bucket_seconds: bucket_seconds.max(1),
            max_entries: max_entries.max(1),
            memory: RwLock::new(MemoryStore::default()),
            redis,
        }
    }

    pub fn memory_only(bucket_seconds: u64) -> Self {
        Self::new(bucket_seconds, DEFAULT_MAX_ENTRIES, None)
    }

    pub fn key(&self, platform: Platform, params: impl Into<String>, now: DateTime<Utc>) -> CacheKey {
        CacheKey::new(platform, params, now, self.bucket_seconds)
    }

    pub fn bucket_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        bucket_start(now, self.bucket_seconds)
    }

    pub async fn get(&self, key: &CacheKey) -> Option<NormalizedBatch> {
        {
            let memory = self.memory.read().await;
            if let Some(slot) = memory.entries.get(key) {
                debug!("Cache hit for {:?}", key);
                return Some(slot.batch.clone());
            }
        }

        if let Some(redis) = &self.redis {
            if let Some(batch) = redis.get::<NormalizedBatch>(&key.redis_key()).await {
                self.memory.write().await.insert(key.clone(), batch.clone(), self.max_entries);
                return Some(batch);
            }
        }

        debug!("Cache miss for {:?}", key);
        None
    }

    pub async fn put(&self, key: CacheKey, batch: NormalizedBatch) {
        if let Some(redis) = &self.redis {
            redis.set_with_tag(&key.redis_key(), &batch, &platform_tag(key.platform)).await;
        }

        self.memory.write().await.insert(key, batch, self.max_entries);
    }

    pub async fn invalidate_platform(&self, platform: Platform) -> usize {
        let mut removed = {
            let mut memory = self.memory.write().await;
            let before = memory.entries.len();
            memory.entries.retain(|k, _| k.platform != platform);
            before - memory.entries.len()
        };

        if let Some(redis) = &self.redis {
            removed += redis.invalidate_tag(&platform_tag(platform)).await;
        }

        info!("Invalidated {} cached {} entries", removed, platform);
        removed
    }

    pub async fn invalidate_all(&self) -> usize {
        let mut removed = 0;
        for platform in Platform::ALL {
            removed += self.invalidate_platform(platform).await;
        }
        removed
    }

    /// Drop in-process entries whose bucket has rolled over.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let current = bucket_for(now, self.bucket_seconds);
        let mut memory = self.memory.write().await;
        let before = memory.entries.len();
        memory.entries.retain(|k, _| k.bucket >= current);
        before - memory.entries.len()
    }

    pub async fn len(&self) -> usize {
        self.memory.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{ Duration, TimeZone };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn batch(skipped: usize) -> NormalizedBatch {
        NormalizedBatch { posts: Vec::new(), skipped, duplicates: 0 }
    }

    #[tokio::test]
    async fn hit_within_bucket_miss_after_rollover() {
        let cache = QueryCache::memory_only(300);
        let key = cache.key(Platform::Reddit, "keyword=nhs", t0());
        cache.put(key.clone(), batch(1)).await;

        let same_bucket = cache.key(Platform::Reddit, "keyword=nhs", t0() + Duration::seconds(60));
        assert_eq!(cache.get(&same_bucket).await, Some(batch(1)));

        let next_bucket = cache.key(Platform::Reddit, "keyword=nhs", t0() + Duration::seconds(300));
        assert_eq!(cache.get(&next_bucket).await, None);
    }

    #[tokio::test]
    async fn keys_differ_by_platform_and_params() {
        let cache = QueryCache::memory_only(300);
        cache.put(cache.key(Platform::Reddit, "keyword=nhs", t0()), batch(0)).await;

        assert!(cache.get(&cache.key(Platform::Twitter, "keyword=nhs", t0())).await.is_none());
        assert!(cache.get(&cache.key(Platform::Reddit, "keyword=gp", t0())).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_platform_only_drops_that_platform() {
        let cache = QueryCache::memory_only(300);
        cache.put(cache.key(Platform::Reddit, "a", t0()), batch(0)).await;
        cache.put(cache.key(Platform::Reddit, "b", t0()), batch(0)).await;
        cache.put(cache.key(Platform::LinkedIn, "a", t0()), batch(0)).await;

        assert_eq!(cache.invalidate_platform(Platform::Reddit).await, 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.invalidate_all().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn purge_removes_stale_buckets() {
        let cache = QueryCache::memory_only(60);
        cache.put(cache.key(Platform::Twitter, "a", t0()), batch(0)).await;

        assert_eq!(cache.purge_expired(t0() + Duration::seconds(30)).await, 0);
        assert_eq!(cache.purge_expired(t0() + Duration::seconds(120)).await, 1);
    }

    #[tokio::test]
    async fn full_store_evicts_oldest_entry() {
        let cache = QueryCache::new(300, 2, None);
        cache.put(cache.key(Platform::Reddit, "seed=1", t0()), batch(1)).await;
        cache.put(cache.key(Platform::Reddit, "seed=2", t0()), batch(2)).await;
        cache.put(cache.key(Platform::Reddit, "seed=3", t0()), batch(3)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&cache.key(Platform::Reddit, "seed=1", t0())).await.is_none());
        assert_eq!(cache.get(&cache.key(Platform::Reddit, "seed=3", t0())).await, Some(batch(3)));

        // Overwriting an existing key does not evict anything.
        cache.put(cache.key(Platform::Reddit, "seed=3", t0()), batch(4)).await;
        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&cache.key(Platform::Reddit, "seed=2", t0())).await.is_some());
    }

    #[test]
    fn bucket_start_is_stable_within_bucket() {
        let start = bucket_start(t0() + Duration::seconds(10), 300);
        assert_eq!(start, t0());
        assert_eq!(bucket_start(t0() + Duration::seconds(299), 300), start);
        assert_eq!(bucket_start(t0() + Duration::seconds(300), 300), t0() + Duration::seconds(300));
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(bucket_for(t0(), 300), bucket_for(t0() + Duration::seconds(299), 300));
        assert_ne!(bucket_for(t0(), 300), bucket_for(t0() + Duration::seconds(300), 300));
    }
}
