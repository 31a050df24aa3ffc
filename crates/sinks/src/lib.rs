//! Plexus - Sinks
//!
//! Delivery endpoints for routed envelopes.
//!
//! # Architecture
//!
//! Every sink owns a bounded queue and one delivery worker. The router only
//! ever calls the non-blocking [`Sink::send`]; a slow destination fills its
//! own queue and loses envelopes without holding up anyone else.
//!
//! ```text
//! [Router] --Arc<Envelope>--> [Sink queue] --> [Delivery worker] --> [Destination]
//!             try_send                          write deadline
//! ```
//!
//! # Sink variants
//!
//! | Variant | Purpose |
//! |---------|---------|
//! | `App` | Stream/recent-log consumer of one application |
//! | `Firehose` | Member of a load-balanced platform-wide shard |
//! | `Drain` | Forwarder to a customer url (blacklist checked) |
//!
//! # Example
//!
//! ```ignore
//! use plexus_sinks::{AppSink, ChannelDestination, Sink, SinkConfig};
//!
//! let (destination, mut rx) = ChannelDestination::new(16);
//! let config = SinkConfig::default();
//! let sink = Sink::from(AppSink::spawn(SinkId::generate("ws"), "app-1", destination, &config, None));
//!
//! sink.send(envelope);
//! let delivered = rx.recv().await;
//! sink.close().await;
//! ```

// =============================================================================
// Sink machinery
// =============================================================================

/// Shared configuration, errors and metrics
pub mod common;

/// Destination trait and drain connector seam
pub mod destination;

/// Bounded queue plus delivery worker
pub mod sink_core;

/// Sink variants and the `Sink` enum
pub mod sink;

// =============================================================================
// App-side helpers
// =============================================================================

/// Envelope kind filter
pub mod filter;

/// Recent log ring per application
pub mod recent;

/// Latest container metric per instance
pub mod container;

pub use common::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_TIMEOUT, MetricsSnapshot, SinkConfig, SinkError,
    SinkMetrics,
};
pub use container::ContainerMetrics;
pub use destination::{ChannelDestination, Destination, DrainConnector, Result};
pub use filter::EnvelopeFilter;
pub use recent::{DEFAULT_RECENT_LOG_CAPACITY, RecentLogs};
pub use sink::{AppSink, DrainSink, FirehoseSink, Sink};
pub use sink_core::{Eviction, EvictionReason, EvictionReceiver, EvictionSender, SinkCore};
