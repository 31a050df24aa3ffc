//! Sink and shard identifiers
//!
//! `SinkId` names one registered sink; `ShardId` names a firehose
//! subscription whose traffic is split across the sinks sharing it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generated sink identifiers
static SINK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a registered sink
///
/// Transports pick the identity when a consumer connects (or call
/// [`SinkId::generate`]); drains derive theirs from the application and
/// destination so discovery create/delete events name the same sink.
///
/// # Example
///
/// ```
/// use plexus_routing::SinkId;
///
/// let id = SinkId::drain("app-1", "syslog://10.0.0.5:514");
/// assert_eq!(id, SinkId::drain("app-1", "syslog://10.0.0.5:514"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(String);

impl SinkId {
    /// Create a sink ID from an explicit identity
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique sink ID with the given prefix
    pub fn generate(prefix: &str) -> Self {
        let n = SINK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{prefix}-{n}"))
    }

    /// Identity of the drain forwarding `app_id` to `url`
    pub fn drain(app_id: &str, url: &str) -> Self {
        Self(format!("drain:{app_id}:{url}"))
    }

    /// Get the sink ID as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SinkId {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SinkId {
    #[inline]
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for SinkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of a firehose shard group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId(String);

impl ShardId {
    /// Create a shard ID
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the shard ID as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ShardId {
    #[inline]
    fn from(s: String) -> Self {
        Self(s)
    }
}
