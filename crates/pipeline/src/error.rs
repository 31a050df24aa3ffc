//! Pipeline error types
//!
//! Errors surfaced to callers registering sinks. Delivery drops are not errors
//! and never appear here.

use plexus_routing::SinkId;
use plexus_sinks::SinkError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sink with this id is already registered
    #[error("sink already registered: {0}")]
    DuplicateSink(SinkId),

    /// Drain registration requested but no connector is installed
    #[error("no drain connector configured")]
    NoDrainConnector,

    /// Registry has been shut down
    #[error("sink manager is shutting down")]
    ShuttingDown,

    /// Sink construction failed (including blacklist rejection)
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Check if this error is a blacklist rejection
    #[inline]
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::Sink(e) if e.is_policy_rejection())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use plexus_routing::RoutingError;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::DuplicateSink(SinkId::new("ws-1"));
        assert!(err.to_string().contains("ws-1"));

        let err = PipelineError::NoDrainConnector;
        assert!(err.to_string().contains("connector"));

        let err = PipelineError::ShuttingDown;
        assert!(err.to_string().contains("shutting down"));

        let err = PipelineError::from(SinkError::DestinationClosed);
        assert_eq!(err.to_string(), "destination closed");
    }

    #[test]
    fn test_policy_rejection() {
        let ip = "10.0.0.1".parse().unwrap();
        let err = PipelineError::from(SinkError::from(RoutingError::blacklisted(
            "syslog://10.0.0.1",
            ip,
        )));
        assert!(err.is_policy_rejection());
        assert!(!PipelineError::NoDrainConnector.is_policy_rejection());
    }
}
