//! Sink variants
//!
//! | Variant | Keyed by | Receives |
//! |---------|----------|----------|
//! | `App` | application | that app's envelopes passing its filter |
//! | `Firehose` | shard | platform-wide stream, one member per shard per envelope |
//! | `Drain` | application + url | that app's envelopes, forwarded to an external url |
//!
//! All three share the same delivery machinery ([`SinkCore`]); they differ
//! only in how the registry indexes them and in what they accept.

use std::fmt;
use std::sync::Arc;

use plexus_protocol::Envelope;
use plexus_routing::{Blacklist, ShardId, SinkId};
use tracing::debug;
use url::Url;

use crate::common::{MetricsSnapshot, SinkConfig, SinkError};
use crate::destination::{Destination, DrainConnector, Result};
use crate::filter::EnvelopeFilter;
use crate::sink_core::{EvictionSender, SinkCore};

// =============================================================================
// App sink
// =============================================================================

/// Per-application consumer connection
#[derive(Debug)]
pub struct AppSink {
    app_id: String,
    filter: EnvelopeFilter,
    core: SinkCore,
}

impl AppSink {
    /// Create an unfiltered app sink and start its delivery worker
    pub fn spawn<D: Destination>(
        id: SinkId,
        app_id: impl Into<String>,
        destination: D,
        config: &SinkConfig,
        evictions: Option<EvictionSender>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            filter: EnvelopeFilter::new(),
            core: SinkCore::spawn(id, destination, config, evictions),
        }
    }

    /// Restrict the envelope kinds this sink accepts
    #[must_use]
    pub fn with_filter(mut self, filter: EnvelopeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Application this sink is registered under
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Kind filter
    pub fn filter(&self) -> &EnvelopeFilter {
        &self.filter
    }
}

// =============================================================================
// Firehose sink
// =============================================================================

/// One member of a firehose shard group
#[derive(Debug)]
pub struct FirehoseSink {
    shard_id: ShardId,
    core: SinkCore,
}

impl FirehoseSink {
    /// Create a firehose member and start its delivery worker
    pub fn spawn<D: Destination>(
        id: SinkId,
        shard_id: ShardId,
        destination: D,
        config: &SinkConfig,
        evictions: Option<EvictionSender>,
    ) -> Self {
        Self {
            shard_id,
            core: SinkCore::spawn(id, destination, config, evictions),
        }
    }

    /// Shard this member belongs to
    pub fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }
}

// =============================================================================
// Drain sink
// =============================================================================

/// Outbound forwarder of one application's envelopes to an external url
#[derive(Debug)]
pub struct DrainSink {
    app_id: String,
    url: Url,
    core: SinkCore,
}

impl DrainSink {
    /// Validate `url` against the blacklist and connect a drain
    ///
    /// Nothing is spawned when the url is rejected. The sink id is derived
    /// from app and url so the same drain cannot be registered twice.
    pub fn connect(
        app_id: &str,
        url: &str,
        blacklist: &Blacklist,
        connector: &dyn DrainConnector,
        config: &SinkConfig,
        evictions: Option<EvictionSender>,
    ) -> Result<Self> {
        blacklist.check_url(url)?;

        let parsed = Url::parse(url).map_err(|e| SinkError::invalid_drain_url(url, e.to_string()))?;
        let destination = connector.connect(app_id, &parsed)?;
        let id = SinkId::drain(app_id, url);

        debug!(sink_id = %id, app_id, url, "drain connected");

        Ok(Self {
            app_id: app_id.to_string(),
            url: parsed,
            core: SinkCore::spawn(id, destination, config, evictions),
        })
    }

    /// Application whose envelopes are drained
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Drain target
    pub fn url(&self) -> &Url {
        &self.url
    }
}

// =============================================================================
// Sink
// =============================================================================

/// A registered sink of any variant
#[derive(Debug)]
pub enum Sink {
    App(AppSink),
    Firehose(FirehoseSink),
    Drain(DrainSink),
}

impl Sink {
    fn core(&self) -> &SinkCore {
        match self {
            Self::App(sink) => &sink.core,
            Self::Firehose(sink) => &sink.core,
            Self::Drain(sink) => &sink.core,
        }
    }

    /// Unique identity
    #[inline]
    pub fn id(&self) -> &SinkId {
        self.core().id()
    }

    /// Try to enqueue an envelope without blocking
    ///
    /// Returns `false` if the queue is full or the sink is dead or closed.
    /// Filtering is the caller's job, see [`Sink::accepts`].
    #[inline]
    pub fn send(&self, envelope: Arc<Envelope>) -> bool {
        self.core().send(envelope)
    }

    /// Check if this sink wants the envelope
    #[inline]
    pub fn accepts(&self, envelope: &Envelope) -> bool {
        match self {
            Self::App(sink) => sink.filter.matches(envelope),
            Self::Firehose(_) | Self::Drain(_) => true,
        }
    }

    /// Stop accepting envelopes and wait for the delivery worker to exit
    pub async fn close(&self) {
        self.core().close().await;
    }

    /// Check if the sink still accepts envelopes
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.core().is_alive()
    }

    /// Owning application (`None` for firehose members)
    pub fn app_id(&self) -> Option<&str> {
        match self {
            Self::App(sink) => Some(&sink.app_id),
            Self::Drain(sink) => Some(&sink.app_id),
            Self::Firehose(_) => None,
        }
    }

    /// Shard (`Some` only for firehose members)
    pub fn shard_id(&self) -> Option<&ShardId> {
        match self {
            Self::Firehose(sink) => Some(&sink.shard_id),
            Self::App(_) | Self::Drain(_) => None,
        }
    }

    /// Variant name for logging
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::App(_) => "app",
            Self::Firehose(_) => "firehose",
            Self::Drain(_) => "drain",
        }
    }

    /// Snapshot of delivery counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.core().metrics()
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind_name(), self.id())
    }
}

impl From<AppSink> for Sink {
    fn from(sink: AppSink) -> Self {
        Self::App(sink)
    }
}

impl From<FirehoseSink> for Sink {
    fn from(sink: FirehoseSink) -> Self {
        Self::Firehose(sink)
    }
}

impl From<DrainSink> for Sink {
    fn from(sink: DrainSink) -> Self {
        Self::Drain(sink)
    }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod tests;
