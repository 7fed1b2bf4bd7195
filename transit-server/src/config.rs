//! Application configuration.
//!
//! All recognised options in one place, loadable from the environment.
//! `PTV_API_KEY` is handled separately by the realtime client because its
//! absence merely disables the overlay.

use std::path::PathBuf;

use crate::domain::ModeTag;
use crate::planner::PlannerConfig;

/// Environment variable listing the feeds: `"vline=/path,metro=/path"`.
pub const FEEDS_VAR: &str = "TRANSIT_FEEDS";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: String, message: String },
}

/// The recognised configuration options.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bundles to load, in merge-priority order.
    pub modes_to_load: Vec<(ModeTag, PathBuf)>,
    /// Minimum dwell when changing vehicles (seconds).
    pub min_transfer_secs: u32,
    /// Next-service look-ahead in days.
    pub max_next_day_search: u32,
    /// Fuzzy lookup score floor.
    pub fuzzy_min_score: u8,
    /// TTL of cached realtime feeds (seconds).
    pub realtime_cache_ttl_secs: u64,
    /// Per-request wall-clock budget (seconds).
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            modes_to_load: Vec::new(),
            min_transfer_secs: 120,
            max_next_day_search: 7,
            fuzzy_min_score: 60,
            realtime_cache_ttl_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load from the environment. `TRANSIT_FEEDS` is required; numeric
    /// options fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let feeds_spec =
            std::env::var(FEEDS_VAR).map_err(|_| ConfigError::MissingVar(FEEDS_VAR))?;
        let modes_to_load = parse_feeds(&feeds_spec)?;

        Ok(Self {
            modes_to_load,
            min_transfer_secs: env_parse("TRANSIT_MIN_TRANSFER_SECS", 120)?,
            max_next_day_search: env_parse("TRANSIT_MAX_NEXT_DAY_SEARCH", 7)?,
            fuzzy_min_score: env_parse("TRANSIT_FUZZY_MIN_SCORE", 60)?,
            realtime_cache_ttl_secs: env_parse("TRANSIT_REALTIME_CACHE_TTL_SECS", 60)?,
            request_timeout_secs: env_parse("TRANSIT_REQUEST_TIMEOUT_SECS", 10)?,
        })
    }

    /// The planner's view of this configuration.
    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            min_transfer_secs: self.min_transfer_secs,
            max_next_day_search: self.max_next_day_search,
            request_timeout_secs: self.request_timeout_secs,
            ..PlannerConfig::default()
        }
    }
}

/// Parse `"mode=path,mode=path"` into load order.
fn parse_feeds(spec: &str) -> Result<Vec<(ModeTag, PathBuf)>, ConfigError> {
    let mut feeds = Vec::new();
    for entry in spec.split(',').filter(|e| !e.trim().is_empty()) {
        let (mode, path) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
            var: FEEDS_VAR.to_string(),
            message: format!("expected mode=path, got {entry:?}"),
        })?;
        let mode = ModeTag::parse(mode.trim()).map_err(|e| ConfigError::Invalid {
            var: FEEDS_VAR.to_string(),
            message: e.to_string(),
        })?;
        feeds.push((mode, PathBuf::from(path.trim())));
    }
    if feeds.is_empty() {
        return Err(ConfigError::Invalid {
            var: FEEDS_VAR.to_string(),
            message: "no feeds listed".to_string(),
        });
    }
    Ok(feeds)
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let config = AppConfig::default();
        assert_eq!(config.min_transfer_secs, 120);
        assert_eq!(config.max_next_day_search, 7);
        assert_eq!(config.fuzzy_min_score, 60);
        assert_eq!(config.realtime_cache_ttl_secs, 60);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn parse_feed_list() {
        let feeds = parse_feeds("vline=/data/vline, metro=/data/metro").unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].0.as_str(), "vline");
        assert_eq!(feeds[0].1, PathBuf::from("/data/vline"));
        assert_eq!(feeds[1].0.as_str(), "metro");
    }

    #[test]
    fn parse_rejects_bad_entries() {
        assert!(parse_feeds("").is_err());
        assert!(parse_feeds("vline").is_err());
        assert!(parse_feeds("VLINE=/data").is_err());
    }

    #[test]
    fn planner_config_inherits_options() {
        let config = AppConfig {
            min_transfer_secs: 300,
            max_next_day_search: 2,
            request_timeout_secs: 5,
            ..AppConfig::default()
        };
        let planner = config.planner();
        assert_eq!(planner.min_transfer_secs, 300);
        assert_eq!(planner.max_next_day_search, 2);
        assert_eq!(planner.request_timeout_secs, 5);
    }
}
