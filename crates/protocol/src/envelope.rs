//! Envelope - the routable unit of telemetry
//!
//! An `Envelope` is immutable once built. The router wraps each one in an
//! `Arc` so any number of sinks can hold it concurrently without copying the
//! payload.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::ProtocolError;
use crate::kind::EnvelopeKind;

/// A single unit of routable telemetry
///
/// # Example
///
/// ```
/// use plexus_protocol::{Envelope, EnvelopeKind};
///
/// let envelope = Envelope::builder("router_z1", EnvelopeKind::LogMessage)
///     .app_id("app-1")
///     .payload("hello")
///     .tag("instance_index", "0")
///     .build();
///
/// assert_eq!(envelope.app_id(), Some("app-1"));
/// assert_eq!(envelope.kind(), EnvelopeKind::LogMessage);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Identity of the emitting agent
    origin: String,

    /// Owning application (empty for platform-level events)
    #[serde(default)]
    app_id: String,

    /// Emission time in nanoseconds since the Unix epoch
    #[serde(default)]
    timestamp: i64,

    /// Payload kind
    kind: EnvelopeKind,

    /// Opaque payload body
    #[serde(default, with = "payload_text")]
    payload: Bytes,

    /// Free-form tags
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl Envelope {
    /// Start building an envelope
    #[inline]
    pub fn builder(origin: impl Into<String>, kind: EnvelopeKind) -> EnvelopeBuilder {
        EnvelopeBuilder::new(origin, kind)
    }

    /// Identity of the emitting agent
    #[inline]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Owning application, or `None` for platform-scoped envelopes
    #[inline]
    pub fn app_id(&self) -> Option<&str> {
        if self.app_id.is_empty() {
            None
        } else {
            Some(&self.app_id)
        }
    }

    /// Check if this envelope belongs to no application
    #[inline]
    pub fn is_platform_scoped(&self) -> bool {
        self.app_id.is_empty()
    }

    /// Emission time in nanoseconds since the Unix epoch
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Payload kind
    #[inline]
    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// Opaque payload body
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// All tags
    #[inline]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Look up a single tag
    #[inline]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Decode an envelope from its debug JSON form
    ///
    /// The JSON form is used by the debug stdin source and stdout tail only;
    /// it is not a wire protocol.
    pub fn from_json(s: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(s)?;
        if envelope.origin.is_empty() {
            return Err(ProtocolError::missing_field("origin"));
        }
        Ok(envelope)
    }

    /// Encode this envelope to its debug JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Builder for [`Envelope`]
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    envelope: Envelope,
}

impl EnvelopeBuilder {
    /// Create a builder for an envelope of the given kind
    pub fn new(origin: impl Into<String>, kind: EnvelopeKind) -> Self {
        Self {
            envelope: Envelope {
                origin: origin.into(),
                app_id: String::new(),
                timestamp: 0,
                kind,
                payload: Bytes::new(),
                tags: BTreeMap::new(),
            },
        }
    }

    /// Set the owning application
    #[must_use]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.envelope.app_id = app_id.into();
        self
    }

    /// Set the timestamp (nanoseconds since the Unix epoch)
    #[must_use]
    pub fn timestamp(mut self, nanos: i64) -> Self {
        self.envelope.timestamp = nanos;
        self
    }

    /// Set the timestamp to the current wall-clock time
    #[must_use]
    pub fn timestamp_now(mut self) -> Self {
        self.envelope.timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        self
    }

    /// Set the payload body
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.envelope.payload = payload.into();
        self
    }

    /// Add a tag
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envelope.tags.insert(key.into(), value.into());
        self
    }

    /// Finish building
    #[inline]
    pub fn build(self) -> Envelope {
        self.envelope
    }
}

/// Payload as text in the debug JSON form
mod payload_text {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(payload))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Bytes::from(text))
    }
}
