//! Router tests
//!
//! App/firehose fan-out, platform-scoped envelopes, metrics and the
//! crossfire-driven run loop.

use std::time::Duration;

use crossfire::mpsc as cf_mpsc;
use plexus_protocol::EnvelopeKind;
use plexus_routing::{Blacklist, ShardId, SinkId};
use plexus_sinks::{ChannelDestination, EnvelopeFilter, SinkConfig};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::*;

fn app_log(app_id: &str, n: i64) -> Envelope {
    Envelope::builder("test", EnvelopeKind::LogMessage)
        .app_id(app_id)
        .timestamp(n)
        .build()
}

fn platform_metric(n: i64) -> Envelope {
    Envelope::builder("test", EnvelopeKind::ValueMetric)
        .timestamp(n)
        .build()
}

fn manager() -> Arc<SinkManager> {
    Arc::new(SinkManager::new(SinkConfig::default(), Blacklist::empty()))
}

async fn next_timestamp(rx: &mut mpsc::Receiver<Arc<Envelope>>) -> i64 {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for envelope")
        .expect("destination closed")
        .timestamp()
}

// ============================================================================
// Route
// ============================================================================

#[tokio::test]
async fn test_route_with_no_sinks() {
    let router = MessageRouter::new(manager());

    let outcome = router.route(app_log("app-1", 1));
    assert!(outcome.is_undelivered());

    let snapshot = router.metrics().snapshot();
    assert_eq!(snapshot.envelopes_received, 1);
    assert_eq!(snapshot.undelivered, 1);
}

#[tokio::test]
async fn test_app_envelope_goes_to_app_and_firehose() {
    let manager = manager();
    let (app_dest, mut app_rx) = ChannelDestination::new(16);
    let (fh_dest, mut fh_rx) = ChannelDestination::new(16);
    manager
        .register_app_sink(SinkId::new("ws"), "app-1", app_dest, EnvelopeFilter::new())
        .unwrap();
    manager
        .register_firehose_sink(ShardId::new("shard-a"), SinkId::new("fh"), fh_dest)
        .unwrap();

    let router = MessageRouter::new(Arc::clone(&manager));
    let outcome = router.route(app_log("app-1", 42));

    assert_eq!(
        outcome,
        RouteOutcome {
            app_deliveries: 1,
            firehose_deliveries: 1,
        }
    );
    assert_eq!(next_timestamp(&mut app_rx).await, 42);
    assert_eq!(next_timestamp(&mut fh_rx).await, 42);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_platform_envelope_goes_to_firehose_only() {
    let manager = manager();
    let (app_dest, mut app_rx) = ChannelDestination::new(16);
    let (fh_dest, mut fh_rx) = ChannelDestination::new(16);
    manager
        .register_app_sink(SinkId::new("ws"), "app-1", app_dest, EnvelopeFilter::new())
        .unwrap();
    manager
        .register_firehose_sink(ShardId::new("shard-a"), SinkId::new("fh"), fh_dest)
        .unwrap();

    let router = MessageRouter::new(Arc::clone(&manager));
    let outcome = router.route(platform_metric(7));

    assert_eq!(outcome.app_deliveries, 0);
    assert_eq!(outcome.firehose_deliveries, 1);
    assert_eq!(next_timestamp(&mut fh_rx).await, 7);
    assert!(app_rx.try_recv().is_err());

    let snapshot = router.metrics().snapshot();
    assert_eq!(snapshot.platform_scoped, 1);
    assert_eq!(snapshot.app_scoped, 0);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_firehose_delivery_independent_of_app_outcome() {
    let manager = manager();
    let (app_dest, _app_rx) = ChannelDestination::new(16);
    let (fh_dest, mut fh_rx) = ChannelDestination::new(16);
    let app_sink = manager
        .register_app_sink(SinkId::new("ws"), "app-1", app_dest, EnvelopeFilter::new())
        .unwrap();
    manager
        .register_firehose_sink(ShardId::new("shard-a"), SinkId::new("fh"), fh_dest)
        .unwrap();

    // Closed but still registered: every app-side send is refused
    app_sink.close().await;

    let router = MessageRouter::new(Arc::clone(&manager));
    let outcome = router.route(app_log("app-1", 3));

    assert_eq!(outcome.app_deliveries, 0);
    assert_eq!(outcome.firehose_deliveries, 1);
    assert_eq!(next_timestamp(&mut fh_rx).await, 3);

    manager.shutdown().await;
}

// ============================================================================
// Run loop
// ============================================================================

#[tokio::test]
async fn test_run_preserves_order_and_stops_on_close() {
    let manager = manager();
    let (destination, mut rx) = ChannelDestination::new(64);
    manager
        .register_app_sink(SinkId::new("ws"), "app-1", destination, EnvelopeFilter::new())
        .unwrap();

    let router = MessageRouter::new(Arc::clone(&manager));
    let metrics = router.metrics_handle();
    let (tx, source_rx) = cf_mpsc::bounded_async(100);
    let router_handle = tokio::spawn(router.run(source_rx));

    for i in 1..=20 {
        tx.send(app_log("app-1", i)).await.unwrap();
    }
    drop(tx);

    timeout(Duration::from_secs(5), router_handle)
        .await
        .expect("router didn't shut down in time")
        .expect("router panicked");

    for i in 1..=20 {
        assert_eq!(next_timestamp(&mut rx).await, i);
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.envelopes_received, 20);
    assert_eq!(snapshot.app_deliveries, 20);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_run_with_closed_input() {
    let router = MessageRouter::new(manager());
    let (tx, source_rx) = cf_mpsc::bounded_async::<Envelope>(10);
    let router_handle = tokio::spawn(router.run(source_rx));

    drop(tx);

    let result = timeout(Duration::from_secs(1), router_handle).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_metrics_handle_outlives_router() {
    let router = MessageRouter::new(manager());
    let handle = router.metrics_handle();

    router.route(platform_metric(1));
    router.route(app_log("app-1", 2));
    drop(router);

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.envelopes_received, 2);
    assert_eq!(snapshot.undelivered, 2);
}
