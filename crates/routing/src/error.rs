//! Routing error types

use std::net::IpAddr;

use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors raised by destination policy checks and range parsing
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Destination address falls inside a blacklisted range
    #[error("destination '{url}' resolves to blacklisted address {ip}")]
    Blacklisted {
        /// Rejected destination
        url: String,
        /// Address that matched
        ip: IpAddr,
    },

    /// Destination URL could not be parsed (strict mode only)
    #[error("invalid destination '{url}': {reason}")]
    InvalidUrl {
        /// Rejected destination
        url: String,
        /// Parse failure
        reason: String,
    },

    /// Destination host is not an IP literal (strict mode only)
    #[error("destination host '{host}' is not an IP address")]
    UnresolvedHost {
        /// Host portion of the destination
        host: String,
    },

    /// Range bound is not an IP address
    #[error("invalid IP address '{value}' in range")]
    InvalidAddress {
        /// Offending value
        value: String,
    },

    /// Range bounds are inconsistent
    #[error("invalid range {start}-{end}: {reason}")]
    InvalidRange {
        /// Start bound
        start: String,
        /// End bound
        end: String,
        /// Why the range is invalid
        reason: &'static str,
    },
}

impl RoutingError {
    /// Create a Blacklisted error
    #[inline]
    pub fn blacklisted(url: impl Into<String>, ip: IpAddr) -> Self {
        Self::Blacklisted {
            url: url.into(),
            ip,
        }
    }

    /// Create an InvalidUrl error
    #[inline]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnresolvedHost error
    #[inline]
    pub fn unresolved_host(host: impl Into<String>) -> Self {
        Self::UnresolvedHost { host: host.into() }
    }

    /// Create an InvalidAddress error
    #[inline]
    pub fn invalid_address(value: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
        }
    }

    /// Create an InvalidRange error
    #[inline]
    pub fn invalid_range(
        start: impl Into<String>,
        end: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidRange {
            start: start.into(),
            end: end.into(),
            reason,
        }
    }

    /// Check if this error is a policy rejection (as opposed to bad input)
    #[inline]
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::Blacklisted { .. } | Self::UnresolvedHost { .. })
    }
}
