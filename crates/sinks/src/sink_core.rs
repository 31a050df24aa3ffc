//! Sink core - bounded delivery queue plus one delivery worker
//!
//! Every sink variant is composed over a `SinkCore`. The core is the only
//! place envelopes cross from the router into a sink:
//!
//! ```text
//! router ──send()──→ [bounded queue] ──→ delivery worker ──write()──→ Destination
//!          try_send,                      one task per sink,
//!          never blocks                   write deadline enforced
//! ```
//!
//! A worker that hits a write error or deadline marks the sink dead and reports
//! an [`Eviction`] to the registry, which removes and closes the sink. The
//! worker never closes its own sink.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use plexus_protocol::Envelope;
use plexus_routing::SinkId;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::{MetricsSnapshot, SinkConfig, SinkError, SinkMetrics};
use crate::destination::Destination;

/// Channel on which sinks report that they must be removed
pub type EvictionSender = mpsc::UnboundedSender<Eviction>;

/// Receiving half of the eviction channel
pub type EvictionReceiver = mpsc::UnboundedReceiver<Eviction>;

/// Why a sink asked to be removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// A write exceeded the write timeout
    WriteTimeout,
    /// The destination reported an error
    WriteFailed,
    /// Too many consecutive sends were dropped
    QueueSaturated,
}

impl EvictionReason {
    /// Get the string name of this reason
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WriteTimeout => "write_timeout",
            Self::WriteFailed => "write_failed",
            Self::QueueSaturated => "queue_saturated",
        }
    }
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to remove a faulty sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    /// Sink to remove
    pub sink_id: SinkId,
    /// Why
    pub reason: EvictionReason,
}

/// Queue, liveness and worker shared by every sink variant
pub struct SinkCore {
    /// Unique identity
    id: SinkId,

    /// Queue sender; `None` once the sink is closing
    sender: RwLock<Option<mpsc::Sender<Arc<Envelope>>>>,

    /// Cleared on fault, saturation or close
    alive: Arc<AtomicBool>,

    /// Counters (shared with the worker)
    metrics: Arc<SinkMetrics>,

    /// Saturation tolerance
    max_consecutive_drops: Option<u32>,

    /// Drops since the last accepted send
    consecutive_drops: AtomicU32,

    /// Stops the worker between writes
    cancel: CancellationToken,

    /// Worker task; taken by the first `close`
    worker: Mutex<Option<JoinHandle<()>>>,

    /// Where evictions are reported
    evictions: Option<EvictionSender>,
}

impl SinkCore {
    /// Create the queue and spawn the delivery worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<D: Destination>(
        id: SinkId,
        destination: D,
        config: &SinkConfig,
        evictions: Option<EvictionSender>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let alive = Arc::new(AtomicBool::new(true));
        let metrics = Arc::new(SinkMetrics::new());
        let cancel = CancellationToken::new();

        let worker = DeliveryWorker {
            id: id.clone(),
            receiver,
            destination,
            write_timeout: config.write_timeout,
            cancel: cancel.clone(),
            alive: Arc::clone(&alive),
            metrics: Arc::clone(&metrics),
            evictions: evictions.clone(),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            id,
            sender: RwLock::new(Some(sender)),
            alive,
            metrics,
            max_consecutive_drops: config.max_consecutive_drops,
            consecutive_drops: AtomicU32::new(0),
            cancel,
            worker: Mutex::new(Some(handle)),
            evictions,
        }
    }

    /// Unique identity
    #[inline]
    pub fn id(&self) -> &SinkId {
        &self.id
    }

    /// Check if the sink still accepts envelopes
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Snapshot of the sink's counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Free queue slots (0 once closed)
    pub fn available_capacity(&self) -> usize {
        self.sender.read().as_ref().map_or(0, mpsc::Sender::capacity)
    }

    /// Try to enqueue an envelope without blocking
    ///
    /// Returns `false` if the queue is full or the sink is dead or closed.
    pub fn send(&self, envelope: Arc<Envelope>) -> bool {
        if !self.is_alive() {
            self.metrics.envelope_dropped();
            return false;
        }

        let result = {
            let guard = self.sender.read();
            match guard.as_ref() {
                Some(sender) => sender.try_send(envelope),
                None => {
                    self.metrics.envelope_dropped();
                    return false;
                }
            }
        };

        match result {
            Ok(()) => {
                self.metrics.envelope_queued();
                self.consecutive_drops.store(0, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.envelope_dropped();
                self.record_saturation();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.envelope_dropped();
                false
            }
        }
    }

    /// Stop the sink and wait for its worker to exit
    ///
    /// Further sends are refused immediately. The worker finishes the write in
    /// progress (bounded by the write timeout), discards whatever is still
    /// queued and closes the destination. Idempotent; concurrent callers all
    /// return only after the worker has exited.
    pub async fn close(&self) {
        let sender = self.sender.write().take();
        drop(sender);
        self.alive.store(false, Ordering::Release);
        self.cancel.cancel();

        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                warn!(sink_id = %self.id, error = %e, "delivery worker ended abnormally");
            }
            debug!(sink_id = %self.id, "sink closed");
        }
    }

    fn record_saturation(&self) {
        let Some(max) = self.max_consecutive_drops else {
            return;
        };

        let drops = self.consecutive_drops.fetch_add(1, Ordering::Relaxed) + 1;
        if drops >= max && self.alive.swap(false, Ordering::AcqRel) {
            warn!(
                sink_id = %self.id,
                consecutive_drops = drops,
                "sink queue saturated, evicting"
            );
            report_eviction(&self.evictions, &self.id, EvictionReason::QueueSaturated);
        }
    }
}

impl fmt::Debug for SinkCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkCore")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Drop for SinkCore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Dedicated task draining one sink's queue into its destination
struct DeliveryWorker<D> {
    id: SinkId,
    receiver: mpsc::Receiver<Arc<Envelope>>,
    destination: D,
    write_timeout: Duration,
    cancel: CancellationToken,
    alive: Arc<AtomicBool>,
    metrics: Arc<SinkMetrics>,
    evictions: Option<EvictionSender>,
}

impl<D: Destination> DeliveryWorker<D> {
    async fn run(mut self) {
        debug!(sink_id = %self.id, "delivery worker started");

        loop {
            let envelope = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            match timeout(self.write_timeout, self.destination.write(envelope)).await {
                Ok(Ok(())) => self.metrics.envelope_written(),
                Ok(Err(e)) => {
                    self.fail(EvictionReason::WriteFailed, &e);
                    break;
                }
                Err(_) => {
                    self.fail(
                        EvictionReason::WriteTimeout,
                        &SinkError::WriteTimeout(self.write_timeout),
                    );
                    break;
                }
            }
        }

        self.receiver.close();
        self.destination.close().await;
        debug!(sink_id = %self.id, "delivery worker stopped");
    }

    fn fail(&self, reason: EvictionReason, error: &SinkError) {
        self.metrics.write_error();
        if self.alive.swap(false, Ordering::AcqRel) {
            warn!(sink_id = %self.id, %reason, error = %error, "sink write failed, evicting");
            report_eviction(&self.evictions, &self.id, reason);
        }
    }
}

fn report_eviction(evictions: &Option<EvictionSender>, id: &SinkId, reason: EvictionReason) {
    if let Some(evictions) = evictions {
        // Registry gone means shutdown is already under way
        let _ = evictions.send(Eviction {
            sink_id: id.clone(),
            reason,
        });
    }
}

#[cfg(test)]
#[path = "sink_core_test.rs"]
mod tests;
