//! Caching for realtime feed blobs.
//!
//! Trip-update feeds refresh upstream roughly twice a minute, and the
//! per-minute call quota is shared across every request in flight, so
//! recently-fetched feeds are kept for a short TTL keyed by mode.

use std::sync::Arc;
use std::time::Duration;

use gtfs_realtime::FeedMessage;
use moka::future::Cache as MokaCache;

use crate::domain::ModeTag;

/// Configuration for the feed cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached feeds.
    pub ttl: Duration,

    /// Maximum number of cached feeds.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 64,
        }
    }
}

/// TTL cache of decoded trip-update feeds, keyed by mode.
#[derive(Debug)]
pub struct FeedCache {
    feeds: MokaCache<ModeTag, Arc<FeedMessage>>,
}

impl FeedCache {
    /// Create a cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let feeds = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { feeds }
    }

    /// Get a cached feed for a mode.
    pub async fn get(&self, mode: &ModeTag) -> Option<Arc<FeedMessage>> {
        self.feeds.get(mode).await
    }

    /// Insert a feed for a mode.
    pub async fn insert(&self, mode: ModeTag, feed: Arc<FeedMessage>) {
        self.feeds.insert(mode, feed).await;
    }

    /// Number of cached feeds (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.feeds.entry_count()
    }

    /// Drop every cached feed.
    pub fn invalidate_all(&self) {
        self.feeds.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(s: &str) -> ModeTag {
        ModeTag::parse(s).unwrap()
    }

    fn empty_feed() -> Arc<FeedMessage> {
        Arc::new(FeedMessage {
            header: gtfs_realtime::FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                ..Default::default()
            },
            entity: Vec::new(),
        })
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 64);
    }

    #[tokio::test]
    async fn insert_and_get() {
        let cache = FeedCache::new(&CacheConfig::default());

        assert!(cache.get(&mode("vline")).await.is_none());
        cache.insert(mode("vline"), empty_feed()).await;
        assert!(cache.get(&mode("vline")).await.is_some());
        // Keys are per mode
        assert!(cache.get(&mode("metro")).await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_gone() {
        let cache = FeedCache::new(&CacheConfig {
            ttl: Duration::from_millis(20),
            max_capacity: 8,
        });

        cache.insert(mode("vline"), empty_feed()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get(&mode("vline")).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_all_clears() {
        let cache = FeedCache::new(&CacheConfig::default());
        cache.insert(mode("vline"), empty_feed()).await;
        cache.invalidate_all();
        assert!(cache.get(&mode("vline")).await.is_none());
    }
}
