//! Service discovery feed
//!
//! The registry learns about drains from two channels: services that appeared
//! and services that disappeared. Any discovery backend can feed them; the
//! registry only knows the event shape.

use tokio::sync::mpsc;

/// Default buffer of each discovery channel
pub const DEFAULT_DISCOVERY_CAPACITY: usize = 1024;

/// One application drain target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppService {
    /// Owning application
    pub app_id: String,
    /// Drain destination
    pub url: String,
}

impl AppService {
    /// Create a service event
    pub fn new(app_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            url: url.into(),
        }
    }
}

/// Receiving side consumed by `SinkManager::start`
#[derive(Debug)]
pub struct DiscoveryFeed {
    /// Drains to create
    pub appeared: mpsc::Receiver<AppService>,
    /// Drains to remove
    pub disappeared: mpsc::Receiver<AppService>,
}

/// Sending side held by the discovery backend
#[derive(Debug, Clone)]
pub struct DiscoveryHandle {
    /// Announce a new drain
    pub appeared: mpsc::Sender<AppService>,
    /// Withdraw a drain
    pub disappeared: mpsc::Sender<AppService>,
}

impl DiscoveryFeed {
    /// Create a connected feed and handle
    pub fn channel(capacity: usize) -> (DiscoveryHandle, Self) {
        let (appeared_tx, appeared) = mpsc::channel(capacity.max(1));
        let (disappeared_tx, disappeared) = mpsc::channel(capacity.max(1));
        (
            DiscoveryHandle {
                appeared: appeared_tx,
                disappeared: disappeared_tx,
            },
            Self {
                appeared,
                disappeared,
            },
        )
    }
}
