//! Plexus - Pipeline
//!
//! The sink registry and the router that feeds it.
//!
//! # Architecture
//!
//! ```text
//! [Ingestion]                [MessageRouter]               [SinkManager]
//!    inbound ──→ AsyncRx<Envelope> ──→ route() ──┬──→ send_to(app_id) ──→ App / Drain sinks
//!                                                └──→ send_to_firehose ──→ one member per ShardGroup
//!
//! [Discovery] ──→ DiscoveryFeed ──→ SinkManager::start ──→ register / unregister drains
//! [Sinks]     ──→ Eviction      ──┘
//! ```
//!
//! # Key Design
//!
//! - **Explicit registry**: one `SinkManager`, shared as `Arc`, no global state
//! - **Non-blocking fan-out**: every delivery is a `try_send` into a sink queue
//! - **Arc envelopes**: one allocation per envelope regardless of fan-out
//! - **Local fault handling**: faulty sinks report an eviction and are removed
//!
//! # Example
//!
//! ```ignore
//! use plexus_pipeline::{DiscoveryFeed, MessageRouter, SinkManager};
//!
//! let manager = Arc::new(SinkManager::new(SinkConfig::default(), blacklist));
//! let (discovery, feed) = DiscoveryFeed::channel(1024);
//! tokio::spawn(Arc::clone(&manager).start(feed, shutdown.clone()));
//!
//! let (tx, rx) = crossfire::mpsc::bounded_async(DEFAULT_INPUT_CAPACITY);
//! tokio::spawn(MessageRouter::new(Arc::clone(&manager)).run(rx));
//! ```

mod discovery;
mod error;
mod metrics;
mod registry;
mod router;
mod shard_group;

pub use discovery::{AppService, DEFAULT_DISCOVERY_CAPACITY, DiscoveryFeed, DiscoveryHandle};
pub use error::{PipelineError, Result};
pub use metrics::{BackpressureTracker, MetricsSnapshot, RouterMetrics};
pub use registry::{DEFAULT_RETENTION_IDLE, SinkManager};
pub use router::{MessageRouter, RouteOutcome, RouterMetricsHandle};
pub use shard_group::ShardGroup;

// Re-export key types from dependencies for convenience
pub use plexus_protocol::Envelope;
pub use plexus_routing::{Blacklist, ShardId, SinkId};
pub use plexus_sinks::{EnvelopeFilter, Sink, SinkConfig};

/// Default buffer size of the inbound envelope channel
pub const DEFAULT_INPUT_CAPACITY: usize = 10_000;
