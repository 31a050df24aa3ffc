//! Recent log retention
//!
//! Each application with traffic gets a `RecentLogs`: the newest log
//! envelopes it emitted, so a consumer attaching late can be shown what just
//! happened before live delivery starts. The registry owns one per app and
//! drops it once the app has been idle for the retention period.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use plexus_protocol::Envelope;

/// Default number of log envelopes retained per application
pub const DEFAULT_RECENT_LOG_CAPACITY: usize = 100;

/// Hard ceiling whatever the configuration asks for
const MAX_RETAINED: usize = 100_000;

/// Newest log envelopes of one application, oldest first
#[derive(Debug)]
pub struct RecentLogs {
    limit: usize,
    entries: Mutex<VecDeque<Arc<Envelope>>>,
}

impl RecentLogs {
    /// Retain at most `limit` envelopes (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, MAX_RETAINED);
        Self {
            limit,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Retain an envelope; past the limit the oldest one goes
    pub fn push(&self, envelope: Arc<Envelope>) {
        let mut entries = self.entries.lock();
        if entries.len() == self.limit {
            entries.pop_front();
        }
        entries.push_back(envelope);
    }

    /// Copy of everything retained, oldest first
    pub fn snapshot(&self) -> Vec<Arc<Envelope>> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "recent_test.rs"]
mod tests;
