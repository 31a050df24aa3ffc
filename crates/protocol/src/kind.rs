//! Envelope kinds
//!
//! The payload carried by an envelope is one of a fixed set of telemetry
//! kinds. The kind is metadata only: routing never decodes the payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Kind of telemetry carried by an [`Envelope`](crate::Envelope)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// Application or platform log line
    LogMessage,
    /// Point-in-time metric value
    ValueMetric,
    /// Monotonic counter increment
    CounterEvent,
    /// Error report from an agent
    Error,
    /// Resource usage of a single application container
    ContainerMetric,
}

impl EnvelopeKind {
    /// All kinds, in declaration order
    pub const ALL: [EnvelopeKind; 5] = [
        Self::LogMessage,
        Self::ValueMetric,
        Self::CounterEvent,
        Self::Error,
        Self::ContainerMetric,
    ];

    /// Get the string name of this kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogMessage => "log_message",
            Self::ValueMetric => "value_metric",
            Self::CounterEvent => "counter_event",
            Self::Error => "error",
            Self::ContainerMetric => "container_metric",
        }
    }

    /// Check if this kind is a log line
    #[inline]
    pub const fn is_log(self) -> bool {
        matches!(self, Self::LogMessage)
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvelopeKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::unknown_kind(s))
    }
}
