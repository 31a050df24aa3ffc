//! Plexus Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use plexus_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[router]\nqueue_capacity = 500").unwrap();
//! assert_eq!(config.router.queue_capacity, 500);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [metrics]
//! interval = "60s"
//!
//! [router]
//! queue_capacity = 100
//! write_timeout = "10s"
//!
//! [blacklist]
//! ranges = [{ start = "10.0.0.0", end = "10.255.255.255" }]
//!
//! [[drains]]
//! app_id = "app-1"
//! url = "syslog://10.1.2.3:514"
//! ```

mod blacklist;
mod drains;
mod error;
mod logging;
mod metrics;
mod router;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use blacklist::{BlacklistConfig, IpRangeConfig};
pub use drains::DrainConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::MetricsConfig;
pub use router::RouterConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,

    /// Queue, timeout and retention settings
    pub router: RouterConfig,

    /// Forbidden drain destinations
    pub blacklist: BlacklistConfig,

    /// Drains announced at startup
    pub drains: Vec<DrainConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Load from a file if it exists, otherwise use defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
