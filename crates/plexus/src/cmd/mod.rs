//! Command implementations

pub mod check;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plexus_config::{BlacklistConfig, Config, RouterConfig};
use plexus_routing::{Blacklist, IpRange};
use plexus_sinks::SinkConfig;
use tracing::info;

/// Paths tried, in order, when no config file is given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/plexus.toml", "plexus.toml"];

/// Load configuration
///
/// An explicit path must exist. Without one the default paths are tried and
/// built-in defaults are used if none exists.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            info!(config = %candidate.display(), "using config file");
            return Config::from_file(&candidate).context("failed to load configuration");
        }
    }

    info!("no config file found, using defaults");
    Ok(Config::default())
}

/// Build the drain blacklist from its config section
pub fn build_blacklist(config: &BlacklistConfig) -> Result<Blacklist> {
    let ranges = config
        .ranges
        .iter()
        .map(|range| {
            IpRange::parse(&range.start, &range.end)
                .with_context(|| format!("invalid blacklist range {}-{}", range.start, range.end))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Blacklist::new(ranges).strict(config.strict))
}

/// Per-sink settings derived from the router section
pub fn sink_config(config: &RouterConfig) -> SinkConfig {
    SinkConfig::default()
        .with_queue_capacity(config.queue_capacity)
        .with_write_timeout(config.write_timeout)
        .with_max_consecutive_drops(config.saturation_limit())
}
