//! Blacklist configuration
//!
//! Inclusive IP ranges that drains must never deliver to.

use serde::Deserialize;

/// One forbidden range, inclusive on both ends
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IpRangeConfig {
    /// First address of the range
    pub start: String,
    /// Last address of the range
    pub end: String,
}

/// Blacklist configuration
///
/// # Example
///
/// ```toml
/// [blacklist]
/// strict = false
/// ranges = [
///     { start = "10.0.0.0", end = "10.255.255.255" },
///     { start = "127.0.0.0", end = "127.255.255.255" },
/// ]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Reject drain urls whose host is not an IP literal
    /// Default: false
    pub strict: bool,

    /// Forbidden ranges, checked in order
    pub ranges: Vec<IpRangeConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty() {
        let config: BlacklistConfig = toml::from_str("").unwrap();
        assert!(!config.strict);
        assert!(config.ranges.is_empty());
    }

    #[test]
    fn test_deserialize_ranges() {
        let config: BlacklistConfig = toml::from_str(
            r#"
strict = true
ranges = [{ start = "127.0.0.0", end = "127.0.0.2" }]
"#,
        )
        .unwrap();
        assert!(config.strict);
        assert_eq!(
            config.ranges,
            vec![IpRangeConfig {
                start: "127.0.0.0".into(),
                end: "127.0.0.2".into(),
            }]
        );
    }
}
