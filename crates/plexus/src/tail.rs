//! Tail destination - human-readable firehose output
//!
//! Prints every envelope it receives, one line each, in the form:
//!
//! ```text
//! 07:34:59.161 app-1 router_z1 log_message   started on port 8080
//! 07:34:59.162 -     router_z1 counter_event requests=12
//! ```
//!
//! Not intended for production use at high throughput.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use owo_colors::{OwoColorize, Style};
use plexus_protocol::{Envelope, EnvelopeKind};
use plexus_sinks::{Destination, SinkError};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

/// Writes formatted envelopes to a byte stream
pub struct TailDestination<W> {
    writer: W,
    color: bool,
}

impl TailDestination<Stdout> {
    /// Tail to the process stdout
    pub fn stdout(color: bool) -> Self {
        Self::new(tokio::io::stdout(), color)
    }
}

impl<W> TailDestination<W> {
    /// Tail to an arbitrary writer
    pub fn new(writer: W, color: bool) -> Self {
        Self { writer, color }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> Destination for TailDestination<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    async fn write(&mut self, envelope: Arc<Envelope>) -> Result<(), SinkError> {
        let mut line = format_line(&envelope, self.color);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.writer.flush().await;
    }
}

/// Format one envelope as a single line (without trailing newline)
pub fn format_line(envelope: &Envelope, color: bool) -> String {
    let dim = if color { Style::new().dimmed() } else { Style::new() };

    let timestamp = format_timestamp_ns(envelope.timestamp());
    let app_id = envelope.app_id().unwrap_or("-");
    let kind = format!("{:<15}", envelope.kind().as_str());
    let payload = String::from_utf8_lossy(envelope.payload());

    format!(
        "{} {} {} {} {}",
        timestamp.style(dim),
        app_id,
        envelope.origin().style(dim),
        kind.style(kind_style(envelope.kind(), color)),
        payload.trim_end_matches(['\r', '\n']),
    )
}

/// Style for an envelope kind
fn kind_style(kind: EnvelopeKind, enabled: bool) -> Style {
    if !enabled {
        return Style::new();
    }
    match kind {
        EnvelopeKind::Error => Style::new().red(),
        EnvelopeKind::LogMessage => Style::new(),
        _ => Style::new().cyan(),
    }
}

/// Format timestamp as HH:MM:SS.mmm (from nanoseconds)
fn format_timestamp_ns(ts_nanos: i64) -> String {
    let secs = ts_nanos.div_euclid(1_000_000_000);
    let nanos = ts_nanos.rem_euclid(1_000_000_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| ts_nanos.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(kind: EnvelopeKind, app_id: &str, payload: &'static str) -> Envelope {
        Envelope::builder("router_z1", kind)
            .app_id(app_id)
            .timestamp(1_700_000_000_161_000_000)
            .payload(payload)
            .build()
    }

    #[test]
    fn test_format_line_plain() {
        let line = format_line(&envelope(EnvelopeKind::LogMessage, "app-1", "started\n"), false);
        assert_eq!(line, "22:13:20.161 app-1 router_z1 log_message     started");
    }

    #[test]
    fn test_format_platform_envelope() {
        let line = format_line(&envelope(EnvelopeKind::CounterEvent, "", "requests=12"), false);
        assert_eq!(line, "22:13:20.161 - router_z1 counter_event   requests=12");
    }

    #[test]
    fn test_colored_line_keeps_content() {
        let line = format_line(&envelope(EnvelopeKind::Error, "app-1", "boom"), true);
        assert!(line.contains("app-1"));
        assert!(line.contains("boom"));
        assert!(line.contains('\u{1b}'));
    }

    #[tokio::test]
    async fn test_writes_one_line_per_envelope() {
        let mut destination = TailDestination::new(Vec::new(), false);
        destination
            .write(Arc::new(envelope(EnvelopeKind::LogMessage, "app-1", "a")))
            .await
            .unwrap();
        destination
            .write(Arc::new(envelope(EnvelopeKind::LogMessage, "app-1", "b")))
            .await
            .unwrap();

        let output = String::from_utf8(destination.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a"));
        assert!(lines[1].ends_with(" b"));
    }
}
