//! Metrics reporting configuration
//!
//! Controls the periodic log line summarising router and sink counters.

use serde::Deserialize;
use std::time::Duration;

/// Metrics configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "60s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable periodic metrics reporting
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize() {
        let config: MetricsConfig = toml::from_str(
            r#"
enabled = false
interval = "5s"
"#,
        )
        .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.interval, Duration::from_secs(5));
    }
}
