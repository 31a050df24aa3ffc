//! Latest container metric per instance
//!
//! Container metrics are point-in-time samples. Only the newest sample of each
//! instance is worth keeping, so `ContainerMetrics` stores one envelope per
//! instance and replaces it when a newer one arrives.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use plexus_protocol::{Envelope, EnvelopeKind, INSTANCE_INDEX_TAG};

/// Newest container metric envelope per instance of one application
#[derive(Debug, Default)]
pub struct ContainerMetrics {
    latest: RwLock<HashMap<String, Arc<Envelope>>>,
}

impl ContainerMetrics {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample, keeping it only if it is the newest for its instance
    ///
    /// Envelopes of any other kind are ignored. Returns `true` if stored.
    pub fn record(&self, envelope: Arc<Envelope>) -> bool {
        if envelope.kind() != EnvelopeKind::ContainerMetric {
            return false;
        }

        let key = instance_key(&envelope);
        let mut latest = self.latest.write();
        match latest.get(&key) {
            Some(current) if current.timestamp() > envelope.timestamp() => false,
            _ => {
                latest.insert(key, envelope);
                true
            }
        }
    }

    /// Newest sample of every instance, ordered by instance key
    pub fn latest(&self) -> Vec<Arc<Envelope>> {
        let latest = self.latest.read();
        let mut entries: Vec<_> = latest.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, e)| Arc::clone(e)).collect()
    }

    /// Number of instances tracked
    pub fn len(&self) -> usize {
        self.latest.read().len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.latest.read().is_empty()
    }
}

/// Instance identity: the instance index tag, falling back to the origin
fn instance_key(envelope: &Envelope) -> String {
    envelope
        .tag(INSTANCE_INDEX_TAG)
        .unwrap_or_else(|| envelope.origin())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(instance: &str, timestamp: i64) -> Arc<Envelope> {
        Arc::new(
            Envelope::builder("cell-1", EnvelopeKind::ContainerMetric)
                .app_id("app-1")
                .timestamp(timestamp)
                .tag(INSTANCE_INDEX_TAG, instance)
                .build(),
        )
    }

    #[test]
    fn test_keeps_newest_per_instance() {
        let store = ContainerMetrics::new();

        assert!(store.record(sample("0", 10)));
        assert!(store.record(sample("1", 5)));
        assert!(store.record(sample("0", 20)));
        assert!(!store.record(sample("0", 15)));

        let latest = store.latest();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].tag(INSTANCE_INDEX_TAG), Some("0"));
        assert_eq!(latest[0].timestamp(), 20);
        assert_eq!(latest[1].timestamp(), 5);
    }

    #[test]
    fn test_ignores_other_kinds() {
        let store = ContainerMetrics::new();
        let log = Arc::new(
            Envelope::builder("cell-1", EnvelopeKind::LogMessage)
                .app_id("app-1")
                .build(),
        );

        assert!(!store.record(log));
        assert!(store.is_empty());
    }

    #[test]
    fn test_falls_back_to_origin() {
        let store = ContainerMetrics::new();
        let untagged = Arc::new(
            Envelope::builder("cell-9", EnvelopeKind::ContainerMetric)
                .app_id("app-1")
                .timestamp(1)
                .build(),
        );

        assert!(store.record(untagged));
        assert_eq!(store.len(), 1);
    }
}
