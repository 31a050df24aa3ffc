//! Router and sink settings
//!
//! Queue sizes, write deadline and retention applied to every sink the
//! registry creates.

use serde::Deserialize;
use std::time::Duration;

/// Router configuration
///
/// # Example
///
/// ```toml
/// [router]
/// queue_capacity = 100
/// input_capacity = 10000
/// write_timeout = "10s"
/// max_consecutive_drops = 0
/// recent_log_capacity = 100
/// retention_idle = "1h"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Delivery queue slots per sink
    /// Default: 100
    pub queue_capacity: usize,

    /// Inbound envelope channel size
    /// Default: 10000
    pub input_capacity: usize,

    /// Deadline for one destination write; exceeding it evicts the sink
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Consecutive refused sends after which a sink is evicted
    /// Default: 0 (never evict for saturation)
    pub max_consecutive_drops: u32,

    /// Log envelopes retained per application for late consumers
    /// Default: 100 (0 disables retention)
    pub recent_log_capacity: usize,

    /// Retention of an application is dropped after this much silence
    /// Default: 1h
    #[serde(with = "humantime_serde")]
    pub retention_idle: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            input_capacity: 10_000,
            write_timeout: Duration::from_secs(10),
            max_consecutive_drops: 0,
            recent_log_capacity: 100,
            retention_idle: Duration::from_secs(3600),
        }
    }
}

impl RouterConfig {
    /// Saturation tolerance, `None` when disabled
    pub fn saturation_limit(&self) -> Option<u32> {
        (self.max_consecutive_drops > 0).then_some(self.max_consecutive_drops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.input_capacity, 10_000);
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.saturation_limit(), None);
        assert_eq!(config.recent_log_capacity, 100);
        assert_eq!(config.retention_idle, Duration::from_secs(3600));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RouterConfig = toml::from_str(
            r#"
queue_capacity = 500
write_timeout = "250ms"
max_consecutive_drops = 1000
"#,
        )
        .unwrap();
        assert_eq!(config.queue_capacity, 500);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
        assert_eq!(config.saturation_limit(), Some(1000));
        // Defaults still apply
        assert_eq!(config.input_capacity, 10_000);
    }
}
