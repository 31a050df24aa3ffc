//! Protocol error types
//!
//! Errors that can occur when building or decoding envelopes.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Envelope kind name not recognised
    #[error("unknown envelope kind: {0}")]
    UnknownKind(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Debug JSON encoding could not be decoded
    #[error("invalid envelope json: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Create an unknown kind error
    #[inline]
    pub fn unknown_kind(name: impl Into<String>) -> Self {
        Self::UnknownKind(name.into())
    }

    /// Create a missing field error
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(field)
    }
}
