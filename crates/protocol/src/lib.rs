//! Plexus Protocol - Envelope types routed by the hub
//!
//! This crate provides the value types that flow through the router:
//! - `Envelope` - immutable unit of telemetry (log, metric, event)
//! - `EnvelopeKind` - mutually exclusive payload kind
//! - `EnvelopeBuilder` - constructs envelopes
//!
//! # Design Principles
//!
//! - **Immutable**: envelopes expose accessors only, nothing mutates after `build()`
//! - **Arc-friendly**: the router wraps each envelope in `Arc` for fan-out
//! - **Opaque payload**: `bytes::Bytes`, never decoded on the routing path

mod envelope;
mod error;
mod kind;

pub use envelope::{Envelope, EnvelopeBuilder};
pub use error::ProtocolError;
pub use kind::EnvelopeKind;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Tag carrying the container instance index of an application
pub const INSTANCE_INDEX_TAG: &str = "instance_index";

#[cfg(test)]
mod envelope_test;
