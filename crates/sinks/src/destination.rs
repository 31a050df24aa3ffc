//! Destinations - where a sink's delivery worker writes envelopes
//!
//! A `Destination` is the transport-facing half of a sink. The delivery worker
//! owns it exclusively and calls `write` once per dequeued envelope under the
//! sink's write deadline. Transports (websocket, streaming RPC, syslog) live
//! outside this crate and plug in by implementing the trait.

use std::sync::Arc;

use async_trait::async_trait;
use plexus_protocol::Envelope;
use tokio::sync::mpsc;
use url::Url;

use crate::common::SinkError;

/// Result type for destination operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Transport-facing write target of a sink
#[async_trait]
pub trait Destination: Send + 'static {
    /// Write one envelope
    ///
    /// May block (suspend) for as long as the transport needs; the worker
    /// bounds the wait with the sink's write timeout. An error evicts the sink.
    async fn write(&mut self, envelope: Arc<Envelope>) -> Result<()>;

    /// Release the transport resource
    ///
    /// Called exactly once, after the last write.
    async fn close(&mut self) {}
}

#[async_trait]
impl Destination for Box<dyn Destination> {
    async fn write(&mut self, envelope: Arc<Envelope>) -> Result<()> {
        (**self).write(envelope).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Creates destinations for drains announced by service discovery
pub trait DrainConnector: Send + Sync {
    /// Build the destination forwarding `app_id`'s envelopes to `url`
    ///
    /// Must not block; connecting lazily on first write is expected.
    fn connect(&self, app_id: &str, url: &Url) -> Result<Box<dyn Destination>>;
}

/// Destination that hands envelopes to a transport writer task
///
/// The consumer-facing transport (for example a websocket writer) owns the
/// receiving half. When the receiver is dropped the consumer is considered
/// disconnected and the next write fails, evicting the sink.
///
/// # Example
///
/// ```ignore
/// let (destination, mut rx) = ChannelDestination::new(16);
/// manager.register_app_sink(SinkId::generate("ws"), "app-1", destination, EnvelopeFilter::new())?;
///
/// while let Some(envelope) = rx.recv().await {
///     websocket.send(encode(&envelope)).await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelDestination {
    sender: mpsc::Sender<Arc<Envelope>>,
}

impl ChannelDestination {
    /// Create a destination and the receiver the transport reads from
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Arc<Envelope>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Wrap an existing sender
    #[inline]
    pub fn from_sender(sender: mpsc::Sender<Arc<Envelope>>) -> Self {
        Self { sender }
    }

    /// Check if the transport side has gone away
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl Destination for ChannelDestination {
    async fn write(&mut self, envelope: Arc<Envelope>) -> Result<()> {
        self.sender
            .send(envelope)
            .await
            .map_err(|_| SinkError::DestinationClosed)
    }
}
