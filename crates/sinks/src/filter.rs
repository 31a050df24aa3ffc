//! Envelope kind filter for app sinks
//!
//! An empty filter matches everything. A restricted filter matches only the
//! listed kinds; stream consumers use [`EnvelopeFilter::logs_only`] to receive
//! nothing but log lines.

use std::collections::HashSet;

use plexus_protocol::{Envelope, EnvelopeKind};

/// Which envelope kinds a sink wants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeFilter {
    /// Allowed kinds (`None` = all)
    kinds: Option<HashSet<EnvelopeKind>>,
}

impl EnvelopeFilter {
    /// Create a filter that matches every envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter that matches only log messages
    pub fn logs_only() -> Self {
        Self::new().with_kinds([EnvelopeKind::LogMessage])
    }

    /// Restrict to the given kinds
    ///
    /// Called repeatedly, the sets accumulate.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EnvelopeKind>) -> Self {
        self.kinds.get_or_insert_with(HashSet::new).extend(kinds);
        self
    }

    /// Check if an envelope passes the filter
    #[inline]
    pub fn matches(&self, envelope: &Envelope) -> bool {
        self.kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&envelope.kind()))
    }

    /// Check if the filter lets everything through
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(kind: EnvelopeKind) -> Envelope {
        Envelope::builder("test", kind).app_id("app-1").build()
    }

    #[test]
    fn test_empty_matches_all() {
        let filter = EnvelopeFilter::new();
        assert!(filter.is_empty());
        for kind in EnvelopeKind::ALL {
            assert!(filter.matches(&envelope(kind)));
        }
    }

    #[test]
    fn test_logs_only() {
        let filter = EnvelopeFilter::logs_only();
        assert!(!filter.is_empty());
        assert!(filter.matches(&envelope(EnvelopeKind::LogMessage)));
        assert!(!filter.matches(&envelope(EnvelopeKind::ValueMetric)));
        assert!(!filter.matches(&envelope(EnvelopeKind::ContainerMetric)));
    }

    #[test]
    fn test_with_kinds_accumulates() {
        let filter = EnvelopeFilter::new()
            .with_kinds([EnvelopeKind::Error])
            .with_kinds([EnvelopeKind::CounterEvent]);

        assert!(filter.matches(&envelope(EnvelopeKind::Error)));
        assert!(filter.matches(&envelope(EnvelopeKind::CounterEvent)));
        assert!(!filter.matches(&envelope(EnvelopeKind::LogMessage)));
    }
}
