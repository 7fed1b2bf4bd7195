//! Trip-update feed client.
//!
//! Fetches GTFS-realtime trip updates per mode over HTTP, authenticated
//! with a `KeyID` header. A sliding-window rate limiter enforces the
//! feed-wide quota of 24 calls per minute shared across modes, a semaphore
//! bounds concurrency, and a short TTL cache absorbs repeated requests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gtfs_realtime::FeedMessage;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, FeedCache};
use crate::domain::ModeTag;

use super::error::RealtimeError;
use super::overlay::decode_feed;

/// Default base URL of the trip-update feeds.
const DEFAULT_BASE_URL: &str =
    "https://api.opendata.transport.vic.gov.au/opendata/public-transport/gtfs/realtime/v1";

/// Feed-wide quota: calls per window.
const RATE_LIMIT_CALLS: usize = 24;

/// Quota window length.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Default maximum concurrent fetches.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Environment variable carrying the API key.
pub const API_KEY_VAR: &str = "PTV_API_KEY";

/// Configuration for the realtime client.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// API key sent as the `KeyID` header
    pub api_key: String,
    /// Base URL of the feeds
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// TTL for cached feeds in seconds
    pub cache_ttl_secs: u64,
}

impl RealtimeConfig {
    /// Create a config with the given API key and defaults elsewhere.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            cache_ttl_secs: 60,
        }
    }

    /// Read the key from `PTV_API_KEY`; `None` disables the overlay.
    pub fn from_env() -> Option<Self> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.is_empty() => Some(Self::new(key)),
            _ => {
                info!("{API_KEY_VAR} not set; realtime overlay disabled");
                None
            }
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }
}

/// Sliding-window rate limiter over the shared feed quota.
///
/// Non-blocking: when the window is full the caller gets a refusal and
/// skips the overlay for this request rather than queueing.
#[derive(Debug)]
struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    async fn try_acquire(&self) -> bool {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();

        while calls
            .front()
            .is_some_and(|&first| now.duration_since(first) > self.window)
        {
            calls.pop_front();
        }

        if calls.len() >= self.max_calls {
            return false;
        }
        calls.push_back(now);
        true
    }
}

/// HTTP client for per-mode trip-update feeds.
#[derive(Debug)]
pub struct RealtimeClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
    limiter: RateLimiter,
    cache: FeedCache,
}

impl RealtimeClient {
    /// Create a client from configuration.
    pub fn new(config: RealtimeConfig) -> Result<Self, RealtimeError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let key = reqwest::header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| RealtimeError::Unauthorized)?;
        headers.insert("KeyID", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            limiter: RateLimiter::new(RATE_LIMIT_CALLS, RATE_LIMIT_WINDOW),
            cache: FeedCache::new(&CacheConfig {
                ttl: Duration::from_secs(config.cache_ttl_secs),
                max_capacity: 64,
            }),
        })
    }

    /// Create a client from the environment; `Err(MissingApiKey)` when the
    /// key is absent so callers can skip the overlay gracefully.
    pub fn from_env() -> Result<Self, RealtimeError> {
        let config = RealtimeConfig::from_env().ok_or(RealtimeError::MissingApiKey)?;
        Self::new(config)
    }

    /// Fetch (or serve from cache) the trip-update feed for one mode.
    pub async fn trip_updates(&self, mode: &ModeTag) -> Result<Arc<FeedMessage>, RealtimeError> {
        if let Some(feed) = self.cache.get(mode).await {
            debug!(mode = %mode, "Trip-update cache hit");
            return Ok(feed);
        }

        if !self.limiter.try_acquire().await {
            warn!(mode = %mode, "Trip-update quota exhausted");
            return Err(RealtimeError::RateLimited);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RealtimeError::Upstream { status: 0 })?;

        let url = format!("{}/{}/trip-updates", self.base_url, mode);
        debug!(mode = %mode, url = %url, "Fetching trip updates");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RealtimeError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RealtimeError::RateLimited);
        }
        if !status.is_success() {
            return Err(RealtimeError::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let feed = Arc::new(decode_feed(&bytes)?);

        info!(
            mode = %mode,
            entities = feed.entity.len(),
            "Trip-update feed fetched"
        );
        self.cache.insert(mode.clone(), Arc::clone(&feed)).await;
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limiter_allows_up_to_quota() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);
    }

    #[tokio::test]
    async fn rate_limiter_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.try_acquire().await);
    }

    #[test]
    fn config_defaults() {
        let config = RealtimeConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.cache_ttl_secs, 60);
    }

    #[test]
    fn builder_overrides() {
        let config = RealtimeConfig::new("key")
            .with_base_url("http://localhost:1234")
            .with_cache_ttl(5);
        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.cache_ttl_secs, 5);
    }

    #[test]
    fn client_builds_with_plain_key() {
        assert!(RealtimeClient::new(RealtimeConfig::new("a-plain-key")).is_ok());
    }

    #[test]
    fn invalid_header_key_is_rejected() {
        let err = RealtimeClient::new(RealtimeConfig::new("bad\nkey")).unwrap_err();
        assert!(matches!(err, RealtimeError::Unauthorized));
    }
}
