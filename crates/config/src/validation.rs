//! Configuration validation
//!
//! Validates config consistency:
//! - Router capacities and write timeout are non-zero
//! - Blacklist ranges are valid addresses of one family, start <= end
//! - Drains name an application and a url

use std::net::IpAddr;
use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_router(config)?;
    validate_metrics(config)?;
    validate_blacklist(config)?;
    validate_drains(config)?;
    Ok(())
}

fn validate_router(config: &Config) -> Result<()> {
    let router = &config.router;

    if router.queue_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "router",
            "router",
            "queue_capacity",
            "must be greater than 0",
        ));
    }
    if router.input_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "router",
            "router",
            "input_capacity",
            "must be greater than 0",
        ));
    }
    if router.write_timeout == Duration::ZERO {
        return Err(ConfigError::invalid_value(
            "router",
            "router",
            "write_timeout",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_metrics(config: &Config) -> Result<()> {
    if config.metrics.enabled && config.metrics.interval == Duration::ZERO {
        return Err(ConfigError::invalid_value(
            "metrics",
            "metrics",
            "interval",
            "must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_blacklist(config: &Config) -> Result<()> {
    for (i, range) in config.blacklist.ranges.iter().enumerate() {
        let name = format!("blacklist.ranges[{i}]");
        let start = parse_ip(&name, "start", &range.start)?;
        let end = parse_ip(&name, "end", &range.end)?;

        if start.is_ipv4() != end.is_ipv4() {
            return Err(ConfigError::invalid_value(
                "blacklist",
                name,
                "range",
                "start and end must be the same address family",
            ));
        }
        if start > end {
            return Err(ConfigError::invalid_value(
                "blacklist",
                name,
                "range",
                format!("start {start} is after end {end}"),
            ));
        }
    }
    Ok(())
}

fn parse_ip(name: &str, field: &'static str, value: &str) -> Result<IpAddr> {
    if value.is_empty() {
        return Err(ConfigError::missing_field("blacklist", name, field));
    }
    value.trim().parse().map_err(|_| {
        ConfigError::invalid_value(
            "blacklist",
            name,
            field,
            format!("'{value}' is not an IP address"),
        )
    })
}

fn validate_drains(config: &Config) -> Result<()> {
    for (i, drain) in config.drains.iter().enumerate() {
        let name = format!("drains[{i}]");
        if drain.app_id.trim().is_empty() {
            return Err(ConfigError::missing_field("drains", name, "app_id"));
        }
        if drain.url.trim().is_empty() {
            return Err(ConfigError::missing_field("drains", name, "url"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn parse(toml: &str) -> Result<Config> {
        Config::from_str(toml)
    }

    #[test]
    fn test_valid_minimal_config() {
        assert!(parse("").is_ok());
    }

    #[test]
    fn test_zero_queue_capacity() {
        let err = parse("[router]\nqueue_capacity = 0").unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
    }

    #[test]
    fn test_zero_input_capacity() {
        let err = parse("[router]\ninput_capacity = 0").unwrap_err();
        assert!(err.to_string().contains("input_capacity"));
    }

    #[test]
    fn test_zero_write_timeout() {
        let err = parse("[router]\nwrite_timeout = \"0s\"").unwrap_err();
        assert!(err.to_string().contains("write_timeout"));
    }

    #[test]
    fn test_zero_metrics_interval_only_when_enabled() {
        assert!(parse("[metrics]\ninterval = \"0s\"").is_err());
        assert!(parse("[metrics]\nenabled = false\ninterval = \"0s\"").is_ok());
    }

    #[test]
    fn test_blacklist_bad_address() {
        let err = parse(
            r#"
[blacklist]
ranges = [{ start = "10.0.0.x", end = "10.0.0.9" }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("10.0.0.x"));
    }

    #[test]
    fn test_blacklist_empty_address() {
        let err = parse(
            r#"
[blacklist]
ranges = [{ start = "", end = "10.0.0.9" }]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "start", .. }));
    }

    #[test]
    fn test_blacklist_mixed_family() {
        let err = parse(
            r#"
[blacklist]
ranges = [{ start = "10.0.0.0", end = "::1" }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("address family"));
    }

    #[test]
    fn test_blacklist_reversed_range() {
        let err = parse(
            r#"
[blacklist]
ranges = [{ start = "10.0.0.9", end = "10.0.0.1" }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ranges[0]"));
    }

    #[test]
    fn test_blacklist_single_address_range() {
        assert!(
            parse(
                r#"
[blacklist]
ranges = [{ start = "fd00::1", end = "fd00::1" }]
"#,
            )
            .is_ok()
        );
    }

    #[test]
    fn test_drain_missing_url() {
        let err = parse(
            r#"
[[drains]]
app_id = "app-1"
url = " "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "url", .. }));
    }

    #[test]
    fn test_drain_missing_app_id() {
        let err = parse(
            r#"
[[drains]]
app_id = ""
url = "syslog://10.0.0.1:514"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "app_id", .. }));
    }
}
