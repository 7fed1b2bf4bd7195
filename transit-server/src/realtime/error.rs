//! Realtime overlay errors.
//!
//! None of these invalidate a scheduled answer: the caller logs, skips the
//! overlay and returns scheduled times.

/// Errors from fetching or decoding the trip-update feed.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// PTV_API_KEY is absent; the overlay is disabled
    #[error("realtime disabled: PTV_API_KEY is not set")]
    MissingApiKey,

    /// The upstream rejected the API key
    #[error("realtime request unauthorized")]
    Unauthorized,

    /// The feed-wide rate limit is exhausted for this window
    #[error("realtime rate limit exhausted")]
    RateLimited,

    /// The upstream answered with a non-success status
    #[error("upstream feed unavailable: status {status}")]
    Upstream { status: u16 },

    /// Transport-level failure
    #[error("realtime http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The protobuf bytes did not parse
    #[error("malformed realtime feed: {0}")]
    MalformedFeed(String),
}

impl RealtimeError {
    /// True when retrying later could succeed (transient upstream states).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Upstream { .. } | Self::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(RealtimeError::RateLimited.is_transient());
        assert!(RealtimeError::Upstream { status: 503 }.is_transient());
        assert!(!RealtimeError::MissingApiKey.is_transient());
        assert!(!RealtimeError::MalformedFeed("truncated".into()).is_transient());
    }
}
