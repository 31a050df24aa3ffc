//! Message router - per-envelope fan-out
//!
//! The `MessageRouter` is the single consumer of the inbound envelope stream.
//! For each envelope it asks the registry to deliver to the owning
//! application's sinks, then to one member of every firehose shard. Both
//! steps are non-blocking, so the only place the router ever waits is the
//! inbound channel.

use std::sync::Arc;

use crossfire::AsyncRx;
use plexus_protocol::Envelope;

use crate::metrics::{MetricsSnapshot, RouterMetrics};
use crate::registry::SinkManager;

/// What happened to one routed envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    /// App and drain sinks that accepted the envelope
    pub app_deliveries: usize,
    /// Shard groups whose chosen member accepted the envelope
    pub firehose_deliveries: usize,
}

impl RouteOutcome {
    /// Total successful enqueues
    #[inline]
    pub fn total(&self) -> usize {
        self.app_deliveries + self.firehose_deliveries
    }

    /// Check if no sink took the envelope
    #[inline]
    pub fn is_undelivered(&self) -> bool {
        self.total() == 0
    }
}

/// Handle for reading router metrics after `run()` consumed the router
#[derive(Debug, Clone)]
pub struct RouterMetricsHandle {
    metrics: Arc<RouterMetrics>,
}

impl RouterMetricsHandle {
    /// Get a snapshot of the router counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Routes inbound envelopes into the sink registry
///
/// # Example
///
/// ```ignore
/// let manager = Arc::new(SinkManager::new(SinkConfig::default(), blacklist));
/// let router = MessageRouter::new(Arc::clone(&manager));
///
/// let (tx, rx) = crossfire::mpsc::bounded_async(10_000);
/// tokio::spawn(router.run(rx));
///
/// tx.send(envelope).await?;
/// ```
pub struct MessageRouter {
    manager: Arc<SinkManager>,
    metrics: Arc<RouterMetrics>,
}

impl MessageRouter {
    /// Create a router over a shared registry
    pub fn new(manager: Arc<SinkManager>) -> Self {
        Self {
            manager,
            metrics: Arc::new(RouterMetrics::new()),
        }
    }

    /// Get a metrics handle that stays valid after `run()`
    pub fn metrics_handle(&self) -> RouterMetricsHandle {
        RouterMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Current router metrics
    #[inline]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Registry this router delivers into
    #[inline]
    pub fn manager(&self) -> &Arc<SinkManager> {
        &self.manager
    }

    /// Route one envelope
    ///
    /// App-scoped envelopes go to their application's sinks and to the
    /// firehose; platform-scoped envelopes go to the firehose only. Firehose
    /// delivery happens regardless of the app-side outcome.
    pub fn route(&self, envelope: Envelope) -> RouteOutcome {
        let envelope = Arc::new(envelope);
        let app_id = envelope.app_id();
        self.metrics.record_received(app_id.is_some());

        let app_deliveries = match app_id {
            Some(app_id) => self.manager.send_to(app_id, Arc::clone(&envelope)),
            None => 0,
        };
        let firehose_deliveries = self.manager.send_to_firehose(Arc::clone(&envelope));

        self.metrics.record_outcome(app_deliveries, firehose_deliveries);

        let outcome = RouteOutcome {
            app_deliveries,
            firehose_deliveries,
        };
        if outcome.is_undelivered() {
            tracing::trace!(
                app_id = app_id.unwrap_or_default(),
                kind = %envelope.kind(),
                "envelope reached no sink"
            );
        }
        outcome
    }

    /// Consume the inbound stream until every sender is gone
    ///
    /// Envelopes are routed in the order they are received.
    pub async fn run(self, receiver: AsyncRx<Envelope>) {
        tracing::info!(
            sink_count = self.manager.sink_count(),
            shard_count = self.manager.shard_count(),
            "router starting"
        );

        while let Ok(envelope) = receiver.recv().await {
            self.route(envelope);
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            envelopes_received = snapshot.envelopes_received,
            app_scoped = snapshot.app_scoped,
            platform_scoped = snapshot.platform_scoped,
            app_deliveries = snapshot.app_deliveries,
            firehose_deliveries = snapshot.firehose_deliveries,
            undelivered = snapshot.undelivered,
            dropped_sends = self.manager.dropped_sends(),
            "router shutting down"
        );
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("manager", &self.manager)
            .field("envelopes_received", &self.metrics.envelopes_received())
            .finish()
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
