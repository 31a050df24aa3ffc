//! Router metrics
//!
//! Atomic counters for tracking routing volume.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the message router
///
/// # Thread Safety
///
/// All methods are safe to call from multiple threads concurrently.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Envelopes taken from the inbound stream
    envelopes_received: AtomicU64,

    /// Envelopes carrying an application id
    app_scoped: AtomicU64,

    /// Envelopes without an application id
    platform_scoped: AtomicU64,

    /// Successful enqueues into app and drain sinks
    app_deliveries: AtomicU64,

    /// Successful enqueues into firehose members
    firehose_deliveries: AtomicU64,

    /// Envelopes that reached no sink at all
    undelivered: AtomicU64,
}

impl RouterMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            envelopes_received: AtomicU64::new(0),
            app_scoped: AtomicU64::new(0),
            platform_scoped: AtomicU64::new(0),
            app_deliveries: AtomicU64::new(0),
            firehose_deliveries: AtomicU64::new(0),
            undelivered: AtomicU64::new(0),
        }
    }

    /// Record an envelope entering the router
    #[inline]
    pub fn record_received(&self, app_scoped: bool) {
        self.envelopes_received.fetch_add(1, Ordering::Relaxed);
        if app_scoped {
            self.app_scoped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.platform_scoped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the outcome of routing one envelope
    #[inline]
    pub fn record_outcome(&self, app_deliveries: usize, firehose_deliveries: usize) {
        self.app_deliveries
            .fetch_add(app_deliveries as u64, Ordering::Relaxed);
        self.firehose_deliveries
            .fetch_add(firehose_deliveries as u64, Ordering::Relaxed);
        if app_deliveries + firehose_deliveries == 0 {
            self.undelivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a point-in-time snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_received: self.envelopes_received.load(Ordering::Relaxed),
            app_scoped: self.app_scoped.load(Ordering::Relaxed),
            platform_scoped: self.platform_scoped.load(Ordering::Relaxed),
            app_deliveries: self.app_deliveries.load(Ordering::Relaxed),
            firehose_deliveries: self.firehose_deliveries.load(Ordering::Relaxed),
            undelivered: self.undelivered.load(Ordering::Relaxed),
        }
    }

    /// Envelopes received so far
    #[inline]
    pub fn envelopes_received(&self) -> u64 {
        self.envelopes_received.load(Ordering::Relaxed)
    }
}

/// Point-in-time snapshot of router metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub envelopes_received: u64,
    pub app_scoped: u64,
    pub platform_scoped: u64,
    pub app_deliveries: u64,
    pub firehose_deliveries: u64,
    pub undelivered: u64,
}

impl MetricsSnapshot {
    /// Fraction of envelopes that reached at least one sink
    ///
    /// Returns None if nothing has been received.
    #[inline]
    pub fn delivery_rate(&self) -> Option<f64> {
        if self.envelopes_received == 0 {
            None
        } else {
            let delivered = self.envelopes_received.saturating_sub(self.undelivered);
            Some(delivered as f64 / self.envelopes_received as f64)
        }
    }

    /// Calculate the difference from an earlier snapshot
    #[inline]
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_received: self
                .envelopes_received
                .saturating_sub(previous.envelopes_received),
            app_scoped: self.app_scoped.saturating_sub(previous.app_scoped),
            platform_scoped: self.platform_scoped.saturating_sub(previous.platform_scoped),
            app_deliveries: self.app_deliveries.saturating_sub(previous.app_deliveries),
            firehose_deliveries: self
                .firehose_deliveries
                .saturating_sub(previous.firehose_deliveries),
            undelivered: self.undelivered.saturating_sub(previous.undelivered),
        }
    }
}

// ============================================================================
// Drop Tracker - Rate-limited logging of refused sends
// ============================================================================

/// Rate-limited logging of sends refused by full or dead sinks
///
/// Aggregates drops and logs a summary at most once per second instead of
/// once per drop.
///
/// # Thresholds
///
/// - >0 drops/sec: WARN level
/// - >100 drops/sec: ERROR level
pub struct BackpressureTracker {
    /// Drops in current interval
    interval_drops: AtomicU64,
    /// Drops since creation
    total_drops: AtomicU64,
    /// Last log time (epoch milliseconds)
    last_log_ms: AtomicU64,
}

/// Log interval in milliseconds
const LOG_INTERVAL_MS: u64 = 1000;
/// Drops per interval that trigger ERROR level
const CRITICAL_DROP_THRESHOLD: u64 = 100;

impl BackpressureTracker {
    /// Create a new tracker
    pub fn new() -> Self {
        Self {
            interval_drops: AtomicU64::new(0),
            total_drops: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(Self::now_ms()),
        }
    }

    /// Record a refused send
    ///
    /// Returns true if a summary log was emitted.
    pub fn record_drop(&self) -> bool {
        self.interval_drops.fetch_add(1, Ordering::Relaxed);
        self.total_drops.fetch_add(1, Ordering::Relaxed);

        self.maybe_log()
    }

    /// Drops since creation
    #[inline]
    pub fn total_drops(&self) -> u64 {
        self.total_drops.load(Ordering::Relaxed)
    }

    fn maybe_log(&self) -> bool {
        let now = Self::now_ms();
        let last = self.last_log_ms.load(Ordering::Relaxed);

        if now.saturating_sub(last) < LOG_INTERVAL_MS {
            return false;
        }

        // Claim the log slot so concurrent callers do not log twice
        if self
            .last_log_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let drops = self.interval_drops.swap(0, Ordering::Relaxed);
        if drops == 0 {
            return false;
        }

        if drops > CRITICAL_DROP_THRESHOLD {
            tracing::error!(
                dropped_envelopes = drops,
                threshold = CRITICAL_DROP_THRESHOLD,
                "high backpressure: sinks cannot keep up"
            );
        } else {
            tracing::warn!(
                dropped_envelopes = drops,
                "backpressure: envelopes dropped in last second"
            );
        }

        true
    }

    #[inline]
    fn now_ms() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn current_drops(&self) -> u64 {
        self.interval_drops.load(Ordering::Relaxed)
    }
}

impl Default for BackpressureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackpressureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackpressureTracker")
            .field(
                "interval_drops",
                &self.interval_drops.load(Ordering::Relaxed),
            )
            .field("total_drops", &self.total_drops.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_received_splits_scope() {
        let metrics = RouterMetrics::new();
        metrics.record_received(true);
        metrics.record_received(true);
        metrics.record_received(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.envelopes_received, 3);
        assert_eq!(snapshot.app_scoped, 2);
        assert_eq!(snapshot.platform_scoped, 1);
    }

    #[test]
    fn test_record_outcome() {
        let metrics = RouterMetrics::new();
        metrics.record_received(true);
        metrics.record_outcome(2, 1);
        metrics.record_received(false);
        metrics.record_outcome(0, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.app_deliveries, 2);
        assert_eq!(snapshot.firehose_deliveries, 1);
        assert_eq!(snapshot.undelivered, 1);
        assert_eq!(snapshot.delivery_rate(), Some(0.5));
    }

    #[test]
    fn test_delivery_rate_empty() {
        assert_eq!(MetricsSnapshot::default().delivery_rate(), None);
    }

    #[test]
    fn test_snapshot_diff() {
        let metrics = RouterMetrics::new();
        metrics.record_received(true);
        let first = metrics.snapshot();

        metrics.record_received(true);
        metrics.record_received(false);
        let diff = metrics.snapshot().diff(&first);

        assert_eq!(diff.envelopes_received, 2);
        assert_eq!(diff.app_scoped, 1);
        assert_eq!(diff.platform_scoped, 1);
    }

    #[test]
    fn test_backpressure_tracker_counts() {
        let tracker = BackpressureTracker::new();

        // Within the first interval nothing is logged
        assert!(!tracker.record_drop());
        assert!(!tracker.record_drop());

        assert_eq!(tracker.current_drops(), 2);
        assert_eq!(tracker.total_drops(), 2);
    }
}
