//! Configuration errors

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Why a configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An entry lacks a value it cannot work without
    #[error("{entry}.{field} is required")]
    MissingField {
        /// Config section, e.g. "drains"
        section: &'static str,
        /// Path of the entry, e.g. "drains[2]"
        entry: String,
        field: &'static str,
    },

    /// A value parsed but is out of range or inconsistent
    #[error("invalid {entry}.{field}: {reason}")]
    InvalidValue {
        section: &'static str,
        entry: String,
        field: &'static str,
        reason: String,
    },

    /// Log level name not recognised
    #[error("unknown log level '{0}' (expected trace, debug, info, warn or error)")]
    UnknownLogLevel(String),
}

impl ConfigError {
    /// Required value absent
    pub fn missing_field(
        section: &'static str,
        entry: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            section,
            entry: entry.into(),
            field,
        }
    }

    /// Value present but unusable
    pub fn invalid_value(
        section: &'static str,
        entry: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            entry: entry.into(),
            field,
            reason: reason.into(),
        }
    }
}
