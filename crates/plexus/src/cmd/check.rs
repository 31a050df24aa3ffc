//! Check command - Validate configuration without starting the router
//!
//! Loads the config file, builds the blacklist, and checks every static
//! drain against the blacklist and the supported transports.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use plexus_config::DrainConfig;
use plexus_routing::Blacklist;
use url::Url;

use crate::cmd::{build_blacklist, load_config};
use crate::drain::drain_target;

/// Check command arguments
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the check command
pub fn run(args: CheckArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let blacklist = build_blacklist(&config.blacklist)?;

    println!("configuration ok");
    println!(
        "  queue capacity {}, write timeout {:?}, input capacity {}",
        config.router.queue_capacity, config.router.write_timeout, config.router.input_capacity
    );
    println!(
        "  blacklist: {} range(s){}",
        blacklist.ranges().len(),
        if blacklist.is_strict() { ", strict" } else { "" }
    );

    let mut rejected = 0;
    for drain in &config.drains {
        match check_drain(drain, &blacklist) {
            Ok(()) => println!("  drain {} -> {}: ok", drain.app_id, drain.url),
            Err(reason) => {
                rejected += 1;
                println!("  drain {} -> {}: {}", drain.app_id, drain.url, reason);
            }
        }
    }

    if rejected > 0 {
        anyhow::bail!("{rejected} of {} drain(s) would be rejected", config.drains.len());
    }
    Ok(())
}

/// Check one drain the way the registry would at registration time
fn check_drain(drain: &DrainConfig, blacklist: &Blacklist) -> std::result::Result<(), String> {
    blacklist.check_url(&drain.url).map_err(|e| e.to_string())?;
    let url = Url::parse(&drain.url).map_err(|e| format!("invalid url: {e}"))?;
    drain_target(&url).map_err(|e| e.to_string())?;
    Ok(())
}
