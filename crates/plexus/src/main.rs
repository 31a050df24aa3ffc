//! Plexus - Telemetry routing hub
//!
//! # Usage
//!
//! ```bash
//! # Run the router (default)
//! plexus
//! plexus --config configs/plexus.toml
//!
//! # Feed JSON envelopes from stdin and print everything routed
//! cat envelopes.jsonl | plexus serve --stdin --tail
//!
//! # Validate a config file and its static drains
//! plexus check --config configs/plexus.toml
//! ```

mod cmd;
mod drain;
mod reporter;
mod source;
mod tail;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plexus_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Plexus - Telemetry routing hub
#[derive(Parser, Debug)]
#[command(name = "plexus")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the router
    Serve(cmd::serve::ServeArgs),

    /// Validate configuration and static drains
    Check(cmd::check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(mut args)) => {
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            init_logging(cli.log_level.as_deref(), args.config.as_deref())?;
            cmd::serve::run(args).await
        }
        Some(Command::Check(mut args)) => {
            // Check prints its report to stdout, no logging
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            cmd::check::run(args)
        }
        None => {
            init_logging(cli.log_level.as_deref(), cli.config.as_deref())?;
            let args = cmd::serve::ServeArgs {
                config: cli.config,
                ..Default::default()
            };
            cmd::serve::run(args).await
        }
    }
}

/// Logging settings from the config file, or defaults when it cannot be read
fn load_log_config(config_path: Option<&Path>) -> LogConfig {
    config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .map(|config| config.log)
        .unwrap_or_default()
}

/// Initialize the tracing subscriber for logging
fn init_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let log_config = load_log_config(config_path);
    // CLI flag > config file > default "info"
    let level = log_config.filter_directive(cli_level);

    let filter = EnvFilter::try_new(&level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let layer = match (log_config.format, log_config.output) {
        (LogFormat::Console, LogOutput::Stdout) => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
        (LogFormat::Console, LogOutput::Stderr) => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .boxed(),
        (LogFormat::Json, LogOutput::Stdout) => fmt::layer().json().with_target(true).boxed(),
        (LogFormat::Json, LogOutput::Stderr) => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
