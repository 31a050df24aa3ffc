//! TCP drain transport
//!
//! Forwards an application's envelopes to a remote collector over plain TCP.
//! Two schemes are understood:
//!
//! - `syslog://host[:port]` - RFC 5424 messages with octet-counting framing
//!   (RFC 6587), port 514 when omitted
//! - `tcp://host:port` - one JSON envelope per line
//!
//! The connection is opened lazily on the first write so that `connect`
//! never blocks the registry. Any I/O error fails the write, which evicts the
//! drain; service discovery re-announces it if the drain is still wanted.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, TimeZone, Utc};
use plexus_protocol::{Envelope, EnvelopeKind, INSTANCE_INDEX_TAG};
use plexus_routing::url_host_ip;
use plexus_sinks::{Destination, DrainConnector, SinkError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

/// Default syslog port
const SYSLOG_PORT: u16 = 514;

/// Default TCP connect deadline
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-level facility, RFC 5424 section 6.2.1
const FACILITY_USER: u8 = 1;
const SEVERITY_ERROR: u8 = 3;
const SEVERITY_INFO: u8 = 6;

/// Wire format of a drain connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Octet-counted RFC 5424 syslog
    Syslog,
    /// Newline-delimited JSON
    JsonLines,
}

impl Framing {
    /// Framing for a drain url scheme
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "syslog" => Some(Self::Syslog),
            "tcp" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Encode one envelope for the wire
    pub fn encode(&self, app_id: &str, envelope: &Envelope) -> Result<Vec<u8>, SinkError> {
        match self {
            Self::Syslog => {
                let message = syslog_message(app_id, envelope);
                Ok(format!("{} {}", message.len(), message).into_bytes())
            }
            Self::JsonLines => {
                let mut line = envelope
                    .to_json()
                    .map_err(|e| SinkError::write(e.to_string()))?;
                line.push('\n');
                Ok(line.into_bytes())
            }
        }
    }
}

/// Creates TCP destinations for discovered drains
#[derive(Debug, Clone)]
pub struct TcpDrainConnector {
    connect_timeout: Duration,
}

impl TcpDrainConnector {
    /// Create a connector with the given connect deadline
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpDrainConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl DrainConnector for TcpDrainConnector {
    fn connect(&self, app_id: &str, url: &Url) -> Result<Box<dyn Destination>, SinkError> {
        let (framing, target) = drain_target(url)?;
        Ok(Box::new(TcpDrainDestination::new(
            app_id,
            target,
            framing,
            self.connect_timeout,
        )))
    }
}

/// Resolve a drain url into its framing and `host:port` target
pub fn drain_target(url: &Url) -> Result<(Framing, String), SinkError> {
    let framing = Framing::from_scheme(url.scheme())
        .ok_or_else(|| SinkError::UnsupportedScheme(url.scheme().to_string()))?;

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| SinkError::invalid_drain_url(url.as_str(), "missing host"))?;

    let port = match (framing, url.port()) {
        (_, Some(port)) => port,
        (Framing::Syslog, None) => SYSLOG_PORT,
        (Framing::JsonLines, None) => {
            return Err(SinkError::invalid_drain_url(url.as_str(), "missing port"));
        }
    };

    let target = match url_host_ip(url) {
        Some(ip) => SocketAddr::new(ip, port).to_string(),
        None => format!("{host}:{port}"),
    };
    Ok((framing, target))
}

/// One drain connection
#[derive(Debug)]
pub struct TcpDrainDestination {
    app_id: String,
    target: String,
    framing: Framing,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpDrainDestination {
    /// Create a destination; nothing is connected until the first write
    pub fn new(
        app_id: impl Into<String>,
        target: impl Into<String>,
        framing: Framing,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            target: target.into(),
            framing,
            connect_timeout,
            stream: None,
        }
    }

    /// Remote address in `host:port` form
    pub fn target(&self) -> &str {
        &self.target
    }

    async fn connect(&self) -> std::io::Result<TcpStream> {
        let stream = match timeout(self.connect_timeout, TcpStream::connect(&self.target)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(std::io::Error::new(
                    ErrorKind::TimedOut,
                    "connection timed out",
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(
                target_addr = %self.target,
                error = %e,
                "failed to set TCP_NODELAY, continuing with default buffering"
            );
        }

        tracing::debug!(app_id = %self.app_id, target_addr = %self.target, "drain connected");
        Ok(stream)
    }
}

#[async_trait]
impl Destination for TcpDrainDestination {
    async fn write(&mut self, envelope: Arc<Envelope>) -> Result<(), SinkError> {
        let frame = self.framing.encode(&self.app_id, &envelope)?;

        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };
        let stream = self.stream.insert(stream);

        let result = stream.write_all(&frame).await;
        if let Err(e) = result {
            self.stream = None;
            return Err(SinkError::Io(e));
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take()
            && let Err(e) = stream.shutdown().await
        {
            tracing::debug!(target_addr = %self.target, error = %e, "drain shutdown failed");
        }
    }
}

// =============================================================================
// Syslog encoding
// =============================================================================

/// Build an RFC 5424 message (without framing)
fn syslog_message(app_id: &str, envelope: &Envelope) -> String {
    let severity = match envelope.kind() {
        EnvelopeKind::Error => SEVERITY_ERROR,
        _ => SEVERITY_INFO,
    };
    let priority = FACILITY_USER * 8 + severity;

    let timestamp = Utc
        .timestamp_nanos(envelope.timestamp())
        .to_rfc3339_opts(SecondsFormat::Micros, true);

    let payload = String::from_utf8_lossy(envelope.payload());

    format!(
        "<{}>1 {} {} {} {} {} - {}",
        priority,
        timestamp,
        header_field(envelope.origin()),
        header_field(app_id),
        header_field(envelope.tag(INSTANCE_INDEX_TAG).unwrap_or("")),
        envelope.kind().as_str(),
        payload.trim_end_matches(['\r', '\n']),
    )
}

/// Header fields are printable ASCII without spaces; empty becomes NILVALUE
fn header_field(value: &str) -> String {
    let cleaned: String = value.chars().filter(|c| c.is_ascii_graphic()).collect();
    if cleaned.is_empty() {
        "-".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "drain_test.rs"]
mod tests;
