//! Sink registry
//!
//! `SinkManager` owns every registered sink and answers the two questions the
//! router asks per envelope: which sinks belong to this application, and which
//! member of each firehose shard is next.
//!
//! ```text
//!                     ┌─ by_app:   app_id  → [AppSink | DrainSink, ...]
//! SinkManager ─ RwLock┼─ by_shard: shard_id → ShardGroup (round-robin)
//!                     └─ locations: sink_id → where it is indexed
//! ```
//!
//! The lock only guards membership. Sends run under the shared read lock and
//! never wait on a sink: each is a non-blocking enqueue. Closing a sink (which
//! can wait up to one write timeout) always happens after it has been taken
//! out of the maps and the lock has been released.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use plexus_protocol::{Envelope, EnvelopeKind};
use plexus_routing::{Blacklist, ShardId, SinkId};
use plexus_sinks::{
    AppSink, ContainerMetrics, DEFAULT_RECENT_LOG_CAPACITY, Destination, DrainConnector,
    DrainSink, EnvelopeFilter, Eviction, EvictionReceiver, EvictionSender, FirehoseSink,
    RecentLogs, Sink, SinkConfig,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::discovery::{AppService, DiscoveryFeed};
use crate::error::{PipelineError, Result};
use crate::metrics::BackpressureTracker;
use crate::shard_group::ShardGroup;

/// Default time after which an application's retained envelopes are dropped
pub const DEFAULT_RETENTION_IDLE: Duration = Duration::from_secs(3600);

/// How often the start loop looks for idle retention buffers
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(30);

/// Where a sink is indexed
#[derive(Debug, Clone)]
enum Location {
    App(String),
    Shard(ShardId),
}

/// Membership maps, always updated together
#[derive(Debug, Default)]
struct Registry {
    by_app: HashMap<String, Vec<Arc<Sink>>>,
    by_shard: HashMap<ShardId, ShardGroup>,
    locations: HashMap<SinkId, Location>,
}

impl Registry {
    fn insert(&mut self, sink: Arc<Sink>, location: Location) {
        self.locations.insert(sink.id().clone(), location.clone());
        match location {
            Location::App(app_id) => self.by_app.entry(app_id).or_default().push(sink),
            Location::Shard(shard_id) => self
                .by_shard
                .entry(shard_id.clone())
                .or_insert_with(|| ShardGroup::new(shard_id))
                .add_member(sink),
        }
    }

    fn remove(&mut self, id: &SinkId) -> Option<Arc<Sink>> {
        match self.locations.remove(id)? {
            Location::App(app_id) => {
                let sinks = self.by_app.get_mut(&app_id)?;
                let index = sinks.iter().position(|s| s.id() == id)?;
                let sink = sinks.remove(index);
                if sinks.is_empty() {
                    self.by_app.remove(&app_id);
                }
                Some(sink)
            }
            Location::Shard(shard_id) => {
                let group = self.by_shard.get_mut(&shard_id)?;
                let sink = group.remove_member(id)?;
                if group.is_empty() {
                    self.by_shard.remove(&shard_id);
                }
                Some(sink)
            }
        }
    }

    fn drain_all(&mut self) -> Vec<Arc<Sink>> {
        self.locations.clear();
        let mut sinks: Vec<_> = self.by_app.drain().flat_map(|(_, v)| v).collect();
        sinks.extend(
            self.by_shard
                .drain()
                .flat_map(|(_, group)| group.members().to_vec()),
        );
        sinks
    }
}

/// Retained envelopes of one application
#[derive(Debug)]
struct AppRetention {
    logs: RecentLogs,
    container: ContainerMetrics,
    last_seen: Mutex<Instant>,
}

impl AppRetention {
    fn new(capacity: usize) -> Self {
        Self {
            logs: RecentLogs::new(capacity),
            container: ContainerMetrics::new(),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn is_idle(&self, idle: Duration) -> bool {
        self.last_seen.lock().elapsed() >= idle
    }
}

/// Registry of all live sinks
///
/// Constructed once and shared as `Arc<SinkManager>` by the router, the
/// transport acceptors and the discovery loop.
pub struct SinkManager {
    /// Applied to every sink created here
    config: SinkConfig,

    /// Drain destination policy
    blacklist: Blacklist,

    /// Factory for drain transports
    connector: Option<Arc<dyn DrainConnector>>,

    /// Log envelopes kept per app (0 disables retention)
    recent_log_capacity: usize,

    /// Idle time after which retention for an app is dropped
    retention_idle: Duration,

    /// Membership
    registry: RwLock<Registry>,

    /// Recent logs and container metrics per app
    retention: RwLock<HashMap<String, Arc<AppRetention>>>,

    /// Handed to every sink for fault reports
    eviction_tx: EvictionSender,

    /// Consumed by `start`
    eviction_rx: Mutex<Option<EvictionReceiver>>,

    /// Rate-limited drop logging
    drops: BackpressureTracker,

    /// Set by `shutdown`; refuses new registrations
    shutting_down: AtomicBool,
}

impl SinkManager {
    /// Create a registry without a drain connector
    pub fn new(config: SinkConfig, blacklist: Blacklist) -> Self {
        let (eviction_tx, eviction_rx) = mpsc::unbounded_channel();
        Self {
            config,
            blacklist,
            connector: None,
            recent_log_capacity: DEFAULT_RECENT_LOG_CAPACITY,
            retention_idle: DEFAULT_RETENTION_IDLE,
            registry: RwLock::new(Registry::default()),
            retention: RwLock::new(HashMap::new()),
            eviction_tx,
            eviction_rx: Mutex::new(Some(eviction_rx)),
            drops: BackpressureTracker::new(),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Install the factory used to create drain transports
    #[must_use]
    pub fn with_drain_connector(mut self, connector: Arc<dyn DrainConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Set how many log envelopes are retained per app (0 disables)
    #[must_use]
    pub fn with_recent_log_capacity(mut self, capacity: usize) -> Self {
        self.recent_log_capacity = capacity;
        self
    }

    /// Set the idle time after which an app's retained envelopes are dropped
    #[must_use]
    pub fn with_retention_idle(mut self, idle: Duration) -> Self {
        self.retention_idle = idle;
        self
    }

    /// Configuration applied to new sinks
    #[inline]
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Drain destination policy
    #[inline]
    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a consumer of one application's envelopes
    pub fn register_app_sink<D: Destination>(
        &self,
        id: SinkId,
        app_id: &str,
        destination: D,
        filter: EnvelopeFilter,
    ) -> Result<Arc<Sink>> {
        self.register(id, Location::App(app_id.to_string()), |id, evictions| {
            Ok(AppSink::spawn(id, app_id, destination, &self.config, evictions)
                .with_filter(filter)
                .into())
        })
    }

    /// Register a member of a firehose shard
    ///
    /// The shard group is created on first use.
    pub fn register_firehose_sink<D: Destination>(
        &self,
        shard_id: ShardId,
        id: SinkId,
        destination: D,
    ) -> Result<Arc<Sink>> {
        self.register(id, Location::Shard(shard_id.clone()), |id, evictions| {
            Ok(FirehoseSink::spawn(id, shard_id, destination, &self.config, evictions).into())
        })
    }

    /// Register a drain forwarding `app_id`'s envelopes to `url`
    ///
    /// The url is checked against the blacklist before any transport is
    /// created; a rejection leaves the registry unchanged.
    pub fn register_drain_sink(&self, app_id: &str, url: &str) -> Result<Arc<Sink>> {
        let connector = self
            .connector
            .as_deref()
            .ok_or(PipelineError::NoDrainConnector)?;

        let id = SinkId::drain(app_id, url);
        self.register(id, Location::App(app_id.to_string()), |_, evictions| {
            let drain = DrainSink::connect(
                app_id,
                url,
                &self.blacklist,
                connector,
                &self.config,
                evictions,
            )?;
            Ok(drain.into())
        })
    }

    /// Insert a sink built by `build` unless the id is taken
    ///
    /// `build` runs under the write lock so a duplicate never spawns a worker.
    fn register(
        &self,
        id: SinkId,
        location: Location,
        build: impl FnOnce(SinkId, Option<EvictionSender>) -> Result<Sink>,
    ) -> Result<Arc<Sink>> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(PipelineError::ShuttingDown);
        }

        let mut registry = self.registry.write();
        if registry.locations.contains_key(&id) {
            return Err(PipelineError::DuplicateSink(id));
        }

        let sink = match build(id, Some(self.eviction_tx.clone())) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                if e.is_policy_rejection() {
                    warn!(error = %e, "sink registration rejected by blacklist");
                }
                return Err(e);
            }
        };

        registry.insert(Arc::clone(&sink), location);
        drop(registry);

        info!(
            sink_id = %sink.id(),
            kind = sink.kind_name(),
            app_id = sink.app_id().unwrap_or_default(),
            shard_id = sink.shard_id().map(ShardId::as_str).unwrap_or_default(),
            "sink registered"
        );

        Ok(sink)
    }

    /// Remove a sink and wait for it to close
    ///
    /// Returns `false` if no sink with this id is registered. Sends racing the
    /// removal either land in the still-open queue or are refused.
    pub async fn unregister(&self, id: &SinkId) -> bool {
        let Some(sink) = self.detach(id) else {
            return false;
        };

        close_sink(sink).await;
        true
    }

    /// Take a sink out of the maps without closing it
    fn detach(&self, id: &SinkId) -> Option<Arc<Sink>> {
        self.registry.write().remove(id)
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Offer an envelope to every sink registered for `app_id`
    ///
    /// Returns the number of sinks that accepted it. A sink refusing the
    /// envelope does not affect the others. Log lines and container metrics
    /// are also retained for late consumers.
    pub fn send_to(&self, app_id: &str, envelope: Arc<Envelope>) -> usize {
        self.retain(app_id, &envelope);

        let registry = self.registry.read();
        let Some(sinks) = registry.by_app.get(app_id) else {
            return 0;
        };

        let mut delivered = 0;
        for sink in sinks.iter().filter(|s| s.accepts(&envelope)) {
            if sink.send(Arc::clone(&envelope)) {
                delivered += 1;
            } else {
                self.record_drop(sink);
            }
        }
        delivered
    }

    /// Offer an envelope to exactly one member of every shard group
    ///
    /// Returns the number of shard groups whose chosen member accepted it.
    pub fn send_to_firehose(&self, envelope: Arc<Envelope>) -> usize {
        let registry = self.registry.read();

        let mut delivered = 0;
        for group in registry.by_shard.values() {
            let Some(member) = group.next() else {
                continue;
            };
            if member.send(Arc::clone(&envelope)) {
                delivered += 1;
            } else {
                self.record_drop(&member);
            }
        }
        delivered
    }

    fn record_drop(&self, sink: &Sink) {
        tracing::trace!(sink_id = %sink.id(), alive = sink.is_alive(), "sink refused envelope");
        self.drops.record_drop();
    }

    fn retain(&self, app_id: &str, envelope: &Arc<Envelope>) {
        let kind = envelope.kind();
        let wanted = (kind.is_log() && self.recent_log_capacity > 0)
            || kind == EnvelopeKind::ContainerMetric;
        if !wanted {
            return;
        }

        let retention = self.retention_for(app_id);
        *retention.last_seen.lock() = Instant::now();
        if kind.is_log() {
            retention.logs.push(Arc::clone(envelope));
        } else {
            retention.container.record(Arc::clone(envelope));
        }
    }

    fn retention_for(&self, app_id: &str) -> Arc<AppRetention> {
        if let Some(retention) = self.retention.read().get(app_id) {
            return Arc::clone(retention);
        }

        let capacity = self.recent_log_capacity;
        Arc::clone(
            self.retention
                .write()
                .entry(app_id.to_string())
                .or_insert_with(|| Arc::new(AppRetention::new(capacity))),
        )
    }

    /// Recent log envelopes of an application, oldest first
    pub fn recent_logs(&self, app_id: &str) -> Vec<Arc<Envelope>> {
        self.retention
            .read()
            .get(app_id)
            .map(|r| r.logs.snapshot())
            .unwrap_or_default()
    }

    /// Newest container metric of every instance of an application
    pub fn latest_container_metrics(&self, app_id: &str) -> Vec<Arc<Envelope>> {
        self.retention
            .read()
            .get(app_id)
            .map(|r| r.container.latest())
            .unwrap_or_default()
    }

    /// Drop retention buffers that saw no envelope for `retention_idle`
    ///
    /// Returns the number of applications pruned.
    pub fn prune_idle_retention(&self) -> usize {
        let idle = self.retention_idle;
        let mut retention = self.retention.write();
        let before = retention.len();
        retention.retain(|_, r| !r.is_idle(idle));
        before - retention.len()
    }

    /// Total envelopes refused by sinks since creation
    #[inline]
    pub fn dropped_sends(&self) -> u64 {
        self.drops.total_drops()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Run the maintenance loop until `shutdown` fires
    ///
    /// Consumes the discovery feed (drains appearing and disappearing), the
    /// eviction reports of faulty sinks, and periodically prunes idle
    /// retention. A closed feed channel is simply no longer polled. Only the
    /// first call does anything; later calls return immediately.
    pub async fn start(self: Arc<Self>, feed: DiscoveryFeed, shutdown: CancellationToken) {
        let Some(mut evictions) = self.eviction_rx.lock().take() else {
            warn!("sink manager already started");
            return;
        };

        let DiscoveryFeed {
            mut appeared,
            mut disappeared,
        } = feed;
        let mut appeared_open = true;
        let mut disappeared_open = true;

        let mut maintenance = tokio::time::interval(MAINTENANCE_INTERVAL);
        maintenance.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Removed sinks close here so a slow close never holds up the feed.
        let mut closing = JoinSet::new();

        info!("sink manager started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                Some(eviction) = evictions.recv() => self.handle_eviction(eviction, &mut closing),
                service = appeared.recv(), if appeared_open => match service {
                    Some(service) => self.handle_appeared(&service),
                    None => {
                        debug!("discovery feed closed: appeared");
                        appeared_open = false;
                    }
                },
                service = disappeared.recv(), if disappeared_open => match service {
                    Some(service) => self.handle_disappeared(&service, &mut closing),
                    None => {
                        debug!("discovery feed closed: disappeared");
                        disappeared_open = false;
                    }
                },
                Some(_) = closing.join_next(), if !closing.is_empty() => {}
                _ = maintenance.tick() => {
                    let pruned = self.prune_idle_retention();
                    if pruned > 0 {
                        debug!(pruned, "pruned idle retention buffers");
                    }
                }
            }
        }

        // Closes still in flight finish in the background.
        closing.detach_all();
        info!("sink manager stopped");
    }

    fn handle_eviction(&self, eviction: Eviction, closing: &mut JoinSet<()>) {
        if let Some(sink) = self.detach(&eviction.sink_id) {
            warn!(sink_id = %eviction.sink_id, reason = %eviction.reason, "sink evicted");
            closing.spawn(close_sink(sink));
        }
    }

    fn handle_appeared(&self, service: &AppService) {
        match self.register_drain_sink(&service.app_id, &service.url) {
            Ok(_) => {}
            Err(PipelineError::DuplicateSink(id)) => {
                debug!(sink_id = %id, "drain already registered");
            }
            Err(e) => {
                warn!(
                    app_id = %service.app_id,
                    url = %service.url,
                    error = %e,
                    "failed to register drain"
                );
            }
        }
    }

    fn handle_disappeared(&self, service: &AppService, closing: &mut JoinSet<()>) {
        let id = SinkId::drain(&service.app_id, &service.url);
        match self.detach(&id) {
            Some(sink) => {
                closing.spawn(close_sink(sink));
            }
            None => debug!(sink_id = %id, "drain to remove was not registered"),
        }
    }

    /// Close and remove every sink
    ///
    /// Later registrations fail with [`PipelineError::ShuttingDown`].
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        let sinks = self.registry.write().drain_all();
        let count = sinks.len();

        let mut closing = JoinSet::new();
        for sink in sinks {
            closing.spawn(async move { sink.close().await });
        }
        while closing.join_next().await.is_some() {}

        info!(sinks_closed = count, "sink manager shut down");
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of registered sinks of all kinds
    pub fn sink_count(&self) -> usize {
        self.registry.read().locations.len()
    }

    /// Number of sinks (app and drain) registered for an application
    pub fn app_sink_count(&self, app_id: &str) -> usize {
        self.registry.read().by_app.get(app_id).map_or(0, Vec::len)
    }

    /// Number of firehose shard groups
    pub fn shard_count(&self) -> usize {
        self.registry.read().by_shard.len()
    }

    /// Number of members in a shard group
    pub fn shard_member_count(&self, shard_id: &ShardId) -> usize {
        self.registry
            .read()
            .by_shard
            .get(shard_id)
            .map_or(0, ShardGroup::len)
    }

    /// Check if a sink is registered
    pub fn contains(&self, id: &SinkId) -> bool {
        self.registry.read().locations.contains_key(id)
    }

    /// Look up a registered sink
    pub fn get(&self, id: &SinkId) -> Option<Arc<Sink>> {
        let registry = self.registry.read();
        match registry.locations.get(id)? {
            Location::App(app_id) => registry
                .by_app
                .get(app_id)?
                .iter()
                .find(|s| s.id() == id)
                .cloned(),
            Location::Shard(shard_id) => registry
                .by_shard
                .get(shard_id)?
                .members()
                .iter()
                .find(|s| s.id() == id)
                .cloned(),
        }
    }
}

impl std::fmt::Debug for SinkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkManager")
            .field("sink_count", &self.sink_count())
            .field("shard_count", &self.shard_count())
            .field("has_drain_connector", &self.connector.is_some())
            .finish()
    }
}

async fn close_sink(sink: Arc<Sink>) {
    sink.close().await;
    info!(sink_id = %sink.id(), kind = sink.kind_name(), "sink unregistered");
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
