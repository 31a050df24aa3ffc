//! `[log]` section
//!
//! How the plexus binary emits its own diagnostics. Envelopes routed by the
//! hub never pass through here.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Verbosity of the binary's own logging
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Hot-path detail such as individual refused sends
    Trace,
    /// Sink workers starting and stopping
    Debug,
    /// Registrations, router start and stop
    #[default]
    Info,
    /// Evictions and rejected drains
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [Self; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Name understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "warning" {
            return Ok(Self::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == lowered)
            .ok_or_else(|| ConfigError::UnknownLogLevel(s.to_string()))
    }
}

/// Line format of the binary's logs
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Stream the binary logs to
///
/// `stderr` keeps stdout free for `--tail` output.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

/// Logging settings
///
/// ```toml
/// [log]
/// level = "info"
/// format = "console"
/// output = "stderr"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
}

impl LogConfig {
    /// Filter directive to install, preferring a command-line override
    ///
    /// The override is passed through untouched so that full `EnvFilter`
    /// directives (`plexus_pipeline=debug,info`) keep working.
    pub fn filter_directive(&self, cli_override: Option<&str>) -> String {
        match cli_override {
            Some(directive) if !directive.trim().is_empty() => directive.to_string(),
            _ => self.level.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.output, LogOutput::Stdout);
    }

    #[test]
    fn test_deserialize_section() {
        let config: LogConfig = toml::from_str(
            r#"
level = "debug"
format = "json"
output = "stderr"
"#,
        )
        .unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stderr);
    }

    #[test]
    fn test_file_output_not_supported() {
        let result: Result<LogConfig, _> = toml::from_str(r#"output = "/var/log/plexus.log""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_level_names_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        }
        assert_eq!(" WARNING ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!(matches!(
            "loud".parse::<LogLevel>(),
            Err(ConfigError::UnknownLogLevel(name)) if name == "loud"
        ));
    }

    #[test]
    fn test_levels_are_ordered_by_verbosity() {
        assert!(LogLevel::Trace < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_filter_directive_prefers_override() {
        let config = LogConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(config.filter_directive(None), "warn");
        assert_eq!(config.filter_directive(Some("")), "warn");
        assert_eq!(
            config.filter_directive(Some("plexus_pipeline=debug,info")),
            "plexus_pipeline=debug,info"
        );
    }
}
