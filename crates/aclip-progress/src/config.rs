//! Tracker configuration.

use std::time::Duration;

/// Shortest interval accepted for any poll loop.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Polling and inference timing for progress trackers.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Interval between project record (download progress) polls
    pub download_interval: Duration,
    /// Interval between pipeline snapshot polls
    pub pipeline_interval: Duration,
    /// Delay before a 100% download is locally promoted to processing
    pub inference_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            download_interval: Duration::from_millis(2000),
            pipeline_interval: Duration::from_millis(2000),
            inference_delay: Duration::from_millis(1000),
        }
    }
}

impl TrackerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            download_interval: env_millis("ACLIP_DOWNLOAD_POLL_MS", 2000).max(MIN_INTERVAL),
            pipeline_interval: env_millis("ACLIP_PIPELINE_POLL_MS", 2000).max(MIN_INTERVAL),
            inference_delay: env_millis("ACLIP_INFERENCE_DELAY_MS", 1000),
        }
    }

    /// Same interval for both poll loops.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        self.download_interval = interval;
        self.pipeline_interval = interval;
        self
    }
}

fn env_millis(key: &str, default: u64) -> Duration {
    Duration::from_millis(
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

/// Clamp an interval so `tokio::time::interval` never sees zero.
pub(crate) fn sane_interval(interval: Duration) -> Duration {
    interval.max(MIN_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.download_interval, Duration::from_secs(2));
        assert_eq!(config.pipeline_interval, Duration::from_secs(2));
        assert_eq!(config.inference_delay, Duration::from_secs(1));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("ACLIP_DOWNLOAD_POLL_MS", "500");
        std::env::set_var("ACLIP_PIPELINE_POLL_MS", "0");
        std::env::set_var("ACLIP_INFERENCE_DELAY_MS", "abc");
        let config = TrackerConfig::from_env();
        assert_eq!(config.download_interval, Duration::from_millis(500));
        assert_eq!(config.pipeline_interval, MIN_INTERVAL);
        assert_eq!(config.inference_delay, Duration::from_secs(1));

        std::env::remove_var("ACLIP_DOWNLOAD_POLL_MS");
        std::env::remove_var("ACLIP_PIPELINE_POLL_MS");
        std::env::remove_var("ACLIP_INFERENCE_DELAY_MS");
    }
}
