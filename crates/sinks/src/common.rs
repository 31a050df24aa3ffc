//! Common types shared by all sinks
//!
//! Configuration, errors and metrics used by every sink variant.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use plexus_routing::RoutingError;
use thiserror::Error;

/// Default delivery queue capacity per sink
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default per-write deadline
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration applied to every sink the registry creates
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Delivery queue slots per sink
    pub queue_capacity: usize,

    /// Deadline for a single destination write
    pub write_timeout: Duration,

    /// Consecutive dropped sends after which a sink is evicted
    ///
    /// `None` keeps saturated sinks registered; they simply lose envelopes.
    pub max_consecutive_drops: Option<u32>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_consecutive_drops: None,
        }
    }
}

impl SinkConfig {
    /// Set queue capacity
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set write timeout
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the saturation tolerance
    #[must_use]
    pub fn with_max_consecutive_drops(mut self, drops: Option<u32>) -> Self {
        self.max_consecutive_drops = drops;
        self
    }
}

/// Counters shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Envelopes accepted into the queue
    pub envelopes_queued: AtomicU64,

    /// Envelopes refused (queue full, sink closed or dead)
    pub envelopes_dropped: AtomicU64,

    /// Envelopes written to the destination
    pub envelopes_written: AtomicU64,

    /// Failed or timed out writes
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            envelopes_queued: AtomicU64::new(0),
            envelopes_dropped: AtomicU64::new(0),
            envelopes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record an accepted send
    #[inline]
    pub fn envelope_queued(&self) {
        self.envelopes_queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a refused send
    #[inline]
    pub fn envelope_dropped(&self) {
        self.envelopes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed write
    #[inline]
    pub fn envelope_written(&self) {
        self.envelopes_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a write error
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_queued: self.envelopes_queued.load(Ordering::Relaxed),
            envelopes_dropped: self.envelopes_dropped.load(Ordering::Relaxed),
            envelopes_written: self.envelopes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub envelopes_queued: u64,
    pub envelopes_dropped: u64,
    pub envelopes_written: u64,
    pub write_errors: u64,
}

/// Common sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination rejected by blacklist policy
    #[error("destination rejected: {0}")]
    Policy(#[from] RoutingError),

    /// Drain URL does not parse
    #[error("invalid drain url '{url}': {reason}")]
    InvalidDrainUrl { url: String, reason: String },

    /// No transport exists for the drain scheme
    #[error("unsupported drain scheme '{0}'")]
    UnsupportedScheme(String),

    /// Destination write did not complete before its deadline
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// Consumer side of the destination went away
    #[error("destination closed")]
    DestinationClosed,

    /// Failed to write data
    #[error("write failed: {0}")]
    Write(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Create an invalid drain url error
    pub fn invalid_drain_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDrainUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Check if this error is a blacklist rejection
    #[inline]
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::Policy(e) if e.is_policy_rejection())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
