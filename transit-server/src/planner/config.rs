//! Planner configuration.

/// Tuning knobs for the connection-scan planner and dispatcher.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Minimum dwell when changing between different trips (seconds).
    /// Connections departing sooner than this after arrival are rejected.
    pub min_transfer_secs: u32,

    /// How many days to advance looking for the next running service.
    pub max_next_day_search: u32,

    /// Per-request wall-clock budget applied by the dispatcher (seconds).
    pub request_timeout_secs: u64,

    /// How many connections to process between cancellation checks.
    pub cancel_check_interval: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_transfer_secs: 120,
            max_next_day_search: 7,
            request_timeout_secs: 10,
            cancel_check_interval: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.min_transfer_secs, 120);
        assert_eq!(config.max_next_day_search, 7);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.cancel_check_interval, 4096);
    }
}
