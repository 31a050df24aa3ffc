//! Static drain configuration
//!
//! Drains listed here are announced to the registry at startup through the
//! same discovery feed a dynamic backend would use.

use serde::Deserialize;

/// One drain target
///
/// # Example
///
/// ```toml
/// [[drains]]
/// app_id = "app-1"
/// url = "syslog://10.1.2.3:514"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DrainConfig {
    /// Application whose envelopes are forwarded
    pub app_id: String,
    /// Destination url
    pub url: String,
}
