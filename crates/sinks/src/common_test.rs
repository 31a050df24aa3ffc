//! Tests for common sink types

use std::time::Duration;

use plexus_routing::RoutingError;

use crate::{SinkConfig, SinkError, SinkMetrics};

#[test]
fn test_metrics_new() {
    let snapshot = SinkMetrics::new().snapshot();

    assert_eq!(snapshot.envelopes_queued, 0);
    assert_eq!(snapshot.envelopes_dropped, 0);
    assert_eq!(snapshot.envelopes_written, 0);
    assert_eq!(snapshot.write_errors, 0);
}

#[test]
fn test_metrics_tracking() {
    let metrics = SinkMetrics::new();

    metrics.envelope_queued();
    metrics.envelope_queued();
    metrics.envelope_dropped();
    metrics.envelope_written();
    metrics.write_error();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.envelopes_queued, 2);
    assert_eq!(snapshot.envelopes_dropped, 1);
    assert_eq!(snapshot.envelopes_written, 1);
    assert_eq!(snapshot.write_errors, 1);
}

#[test]
fn test_config_default() {
    let config = SinkConfig::default();
    assert_eq!(config.queue_capacity, 100);
    assert_eq!(config.write_timeout, Duration::from_secs(10));
    assert_eq!(config.max_consecutive_drops, None);
}

#[test]
fn test_config_builders() {
    let config = SinkConfig::default()
        .with_queue_capacity(2)
        .with_write_timeout(Duration::from_millis(10))
        .with_max_consecutive_drops(Some(5));

    assert_eq!(config.queue_capacity, 2);
    assert_eq!(config.write_timeout, Duration::from_millis(10));
    assert_eq!(config.max_consecutive_drops, Some(5));
}

#[test]
fn test_error_display() {
    let err = SinkError::invalid_drain_url("nope", "relative URL without a base");
    assert!(err.to_string().contains("nope"));

    let err = SinkError::UnsupportedScheme("gopher".into());
    assert!(err.to_string().contains("gopher"));

    let err = SinkError::WriteTimeout(Duration::from_millis(10));
    assert!(err.to_string().contains("10ms"));

    let err = SinkError::write("broken pipe");
    assert!(err.to_string().contains("broken pipe"));
}

#[test]
fn test_policy_rejection() {
    let ip = "127.0.0.1".parse().unwrap();
    let err: SinkError = RoutingError::blacklisted("syslog://127.0.0.1:514", ip).into();
    assert!(err.is_policy_rejection());
    assert!(!SinkError::DestinationClosed.is_policy_rejection());
}
