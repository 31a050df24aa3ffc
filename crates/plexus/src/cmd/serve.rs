//! Serve command - Run the router
//!
//! Wires the sink registry, the message router and the optional debug
//! input and tail output, then runs until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use plexus_config::Config;
use plexus_pipeline::{
    AppService, DEFAULT_DISCOVERY_CAPACITY, DiscoveryFeed, MessageRouter, SinkManager,
};
use plexus_routing::{ShardId, SinkId};
use tokio::io::BufReader;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cmd::{build_blacklist, load_config, sink_config};
use crate::drain::TcpDrainConnector;
use crate::reporter::MetricsReporter;
use crate::source::{JsonLineSource, SourceStats};
use crate::tail::TailDestination;

/// Shard the `--tail` output joins
const TAIL_SHARD: &str = "tail";

/// Time allowed for each component to stop
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to configs/plexus.toml if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read JSON envelopes from stdin, one per line; stop at end of input
    #[arg(long)]
    pub stdin: bool,

    /// Print every envelope routed through the firehose to stdout
    #[arg(long)]
    pub tail: bool,

    /// Disable colors in tail output
    #[arg(long)]
    pub no_color: bool,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path,
        "plexus starting"
    );

    let config = load_config(args.config.as_deref())?;

    if let Err(e) = run_server(config, &args).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("plexus shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config, args: &ServeArgs) -> Result<()> {
    let cancel = CancellationToken::new();

    let blacklist = build_blacklist(&config.blacklist)?;
    info!(
        ranges = blacklist.ranges().len(),
        strict = blacklist.is_strict(),
        "drain blacklist loaded"
    );

    let manager = Arc::new(
        SinkManager::new(sink_config(&config.router), blacklist)
            .with_drain_connector(Arc::new(TcpDrainConnector::new(config.router.write_timeout)))
            .with_recent_log_capacity(config.router.recent_log_capacity)
            .with_retention_idle(config.router.retention_idle),
    );

    // Registry maintenance: discovery, evictions, retention pruning
    let (discovery, feed) = DiscoveryFeed::channel(DEFAULT_DISCOVERY_CAPACITY);
    let registry_task = tokio::spawn(Arc::clone(&manager).start(feed, cancel.clone()));

    for drain in &config.drains {
        discovery
            .appeared
            .send(AppService::new(&drain.app_id, &drain.url))
            .await
            .context("sink manager stopped before static drains were announced")?;
    }
    if !config.drains.is_empty() {
        info!(drains = config.drains.len(), "static drains announced");
    }

    if args.tail {
        let sink = manager
            .register_firehose_sink(
                ShardId::new(TAIL_SHARD),
                SinkId::generate("tail"),
                TailDestination::stdout(!args.no_color),
            )
            .context("failed to register tail output")?;
        info!(sink_id = %sink.id(), "tail output enabled");
    }

    let router = MessageRouter::new(Arc::clone(&manager));
    let router_metrics = router.metrics_handle();

    let (input_tx, input_rx) = crossfire::mpsc::bounded_async(config.router.input_capacity);
    let router_task = tokio::spawn(router.run(input_rx));

    let mut source_task: Option<JoinHandle<SourceStats>> = if args.stdin {
        let source = JsonLineSource::new(BufReader::new(tokio::io::stdin()), input_tx.clone());
        Some(tokio::spawn(source.run(cancel.clone())))
    } else {
        None
    };

    let metrics_task = {
        let reporter = MetricsReporter::new(
            config.metrics.clone(),
            router_metrics,
            Arc::clone(&manager),
        );
        tokio::spawn(reporter.run(cancel.clone()))
    };

    info!(
        stdin = args.stdin,
        tail = args.tail,
        queue_capacity = config.router.queue_capacity,
        write_timeout = ?config.router.write_timeout,
        metrics_enabled = config.metrics.enabled,
        "plexus running"
    );

    let mut source_finished = false;
    tokio::select! {
        _ = wait_for_shutdown() => info!("shutdown signal received, stopping router..."),
        stats = wait_for_source(&mut source_task) => {
            source_finished = true;
            info!(
                accepted = stats.accepted,
                rejected = stats.rejected,
                "input finished, stopping router..."
            );
        }
    }

    cancel.cancel();

    // Sources stop first so the router sees every sender go away
    if let Some(task) = source_task.take()
        && !source_finished
    {
        await_task("source", task).await;
    }
    drop(input_tx);
    await_task("router", router_task).await;

    manager.shutdown().await;
    await_task("sink manager", registry_task).await;
    await_task("metrics reporter", metrics_task).await;

    Ok(())
}

/// Resolve when the source finishes; never resolves without one
async fn wait_for_source(task: &mut Option<JoinHandle<SourceStats>>) -> SourceStats {
    match task.as_mut() {
        Some(handle) => match handle.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "source task panicked");
                SourceStats::default()
            }
        },
        None => std::future::pending().await,
    }
}

/// Wait for a component task, bounded by the shutdown timeout
async fn await_task<T>(name: &str, task: JoinHandle<T>) {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(component = name, error = %e, "task panicked during shutdown"),
        Err(_) => warn!(
            component = name,
            "task did not finish within timeout, continuing shutdown"
        ),
    }
}

/// Wait for ctrl-c or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
