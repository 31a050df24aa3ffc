//! Tests for Envelope and EnvelopeKind

use std::str::FromStr;
use std::sync::Arc;

use crate::{Envelope, EnvelopeKind, ProtocolError};

// =============================================================================
// Builder tests
// =============================================================================

#[test]
fn test_builder_defaults() {
    let envelope = Envelope::builder("metron", EnvelopeKind::ValueMetric).build();

    assert_eq!(envelope.origin(), "metron");
    assert_eq!(envelope.app_id(), None);
    assert!(envelope.is_platform_scoped());
    assert_eq!(envelope.timestamp(), 0);
    assert!(envelope.payload().is_empty());
    assert!(envelope.tags().is_empty());
}

#[test]
fn test_builder_all_fields() {
    let envelope = Envelope::builder("router_z1", EnvelopeKind::LogMessage)
        .app_id("app-1")
        .timestamp(42)
        .payload("GET /health 200")
        .tag("instance_index", "3")
        .tag("deployment", "cf")
        .build();

    assert_eq!(envelope.app_id(), Some("app-1"));
    assert!(!envelope.is_platform_scoped());
    assert_eq!(envelope.timestamp(), 42);
    assert_eq!(envelope.payload().as_ref(), b"GET /health 200");
    assert_eq!(envelope.tag("instance_index"), Some("3"));
    assert_eq!(envelope.tag("missing"), None);
    assert_eq!(envelope.tags().len(), 2);
}

#[test]
fn test_empty_app_id_is_platform_scoped() {
    let envelope = Envelope::builder("doppler", EnvelopeKind::CounterEvent)
        .app_id("")
        .build();
    assert_eq!(envelope.app_id(), None);
}

#[test]
fn test_timestamp_now_is_positive() {
    let envelope = Envelope::builder("o", EnvelopeKind::Error)
        .timestamp_now()
        .build();
    assert!(envelope.timestamp() > 0);
}

#[test]
fn test_envelope_shared_across_threads() {
    let envelope = Arc::new(
        Envelope::builder("o", EnvelopeKind::LogMessage)
            .app_id("app")
            .build(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let envelope = Arc::clone(&envelope);
            std::thread::spawn(move || envelope.app_id().map(str::to_owned))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("app"));
    }
}

// =============================================================================
// Kind tests
// =============================================================================

#[test]
fn test_kind_names_parse_back() {
    for kind in EnvelopeKind::ALL {
        assert_eq!(EnvelopeKind::from_str(kind.as_str()).unwrap(), kind);
        assert_eq!(kind.to_string(), kind.as_str());
    }
}

#[test]
fn test_kind_unknown() {
    let result = EnvelopeKind::from_str("http_start_stop");
    assert!(matches!(result, Err(ProtocolError::UnknownKind(_))));
}

#[test]
fn test_kind_is_log() {
    assert!(EnvelopeKind::LogMessage.is_log());
    assert!(!EnvelopeKind::ContainerMetric.is_log());
}

// =============================================================================
// Debug JSON tests
// =============================================================================

#[test]
fn test_from_json_minimal() {
    let envelope = Envelope::from_json(r#"{"origin":"metron","kind":"value_metric"}"#).unwrap();
    assert_eq!(envelope.origin(), "metron");
    assert_eq!(envelope.kind(), EnvelopeKind::ValueMetric);
    assert!(envelope.is_platform_scoped());
}

#[test]
fn test_from_json_full() {
    let json = r#"{
        "origin": "rep",
        "app_id": "app-7",
        "timestamp": 1700000000,
        "kind": "log_message",
        "payload": "started",
        "tags": {"instance_index": "1"}
    }"#;
    let envelope = Envelope::from_json(json).unwrap();
    assert_eq!(envelope.app_id(), Some("app-7"));
    assert_eq!(envelope.payload().as_ref(), b"started");
    assert_eq!(envelope.tag("instance_index"), Some("1"));
}

#[test]
fn test_from_json_requires_origin() {
    let result = Envelope::from_json(r#"{"origin":"","kind":"error"}"#);
    assert!(matches!(result, Err(ProtocolError::MissingField("origin"))));
}

#[test]
fn test_from_json_rejects_unknown_kind() {
    let result = Envelope::from_json(r#"{"origin":"o","kind":"histogram"}"#);
    assert!(matches!(result, Err(ProtocolError::InvalidJson(_))));
}

#[test]
fn test_to_json_carries_payload_as_text() {
    let envelope = Envelope::builder("o", EnvelopeKind::LogMessage)
        .payload("hello")
        .build();
    let json = envelope.to_json().unwrap();
    assert!(json.contains(r#""payload":"hello""#));
    assert_eq!(Envelope::from_json(&json).unwrap(), envelope);
}
