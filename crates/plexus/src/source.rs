//! JSON-lines debug source
//!
//! Reads one JSON envelope per line (typically from stdin) and feeds the
//! router's inbound stream. Malformed lines are logged and skipped. The
//! source stops at end of input, on cancellation, or when the router is gone.
//!
//! # Usage
//!
//! ```ignore
//! let (tx, rx) = crossfire::mpsc::bounded_async(10_000);
//! let source = JsonLineSource::new(BufReader::new(tokio::io::stdin()), tx);
//! let stats = source.run(cancel).await;
//! ```
//!
//! Not a production ingestion path.

use crossfire::MAsyncTx;
use plexus_protocol::Envelope;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

/// Counters reported when the source stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Non-empty lines read
    pub lines: u64,
    /// Envelopes handed to the router
    pub accepted: u64,
    /// Lines that did not decode
    pub rejected: u64,
}

/// Line-oriented envelope reader
pub struct JsonLineSource<R> {
    reader: R,
    sender: MAsyncTx<Envelope>,
}

impl<R> JsonLineSource<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Create a source reading from `reader`
    pub fn new(reader: R, sender: MAsyncTx<Envelope>) -> Self {
        Self { reader, sender }
    }

    /// Read until end of input or cancellation
    pub async fn run(self, cancel: CancellationToken) -> SourceStats {
        let mut stats = SourceStats::default();
        let mut lines = self.reader.lines();

        tracing::info!("json line source started");

        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::info!("end of input");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "input read error");
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            stats.lines += 1;

            let envelope = match Envelope::from_json(line) {
                Ok(envelope) => envelope,
                Err(e) => {
                    stats.rejected += 1;
                    tracing::warn!(line = stats.lines, error = %e, "skipping malformed envelope");
                    continue;
                }
            };

            if self.sender.send(envelope).await.is_err() {
                tracing::debug!("router stopped, closing source");
                break;
            }
            stats.accepted += 1;
        }

        tracing::info!(
            lines = stats.lines,
            accepted = stats.accepted,
            rejected = stats.rejected,
            "json line source stopped"
        );
        stats
    }
}
