//! Destination blacklist
//!
//! A `Blacklist` rejects delivery destinations whose host is an IP address
//! inside one of the configured ranges. Checks are pure: no DNS lookups are
//! performed, so hosts that are not IP literals cannot be matched against a
//! range. Those (and URLs that do not parse) are allowed by default and
//! rejected only in strict mode.

use std::net::IpAddr;

use tracing::debug;
use url::{Host, Url};

use crate::error::{Result, RoutingError};
use crate::ip_range::IpRange;

/// Ordered set of forbidden destination ranges
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    /// Ranges checked in order; first match rejects
    ranges: Vec<IpRange>,
    /// Reject destinations whose host is not an IP literal
    strict: bool,
}

impl Blacklist {
    /// Create a blacklist from ranges (fail-open for non-IP hosts)
    pub fn new(ranges: Vec<IpRange>) -> Self {
        Self {
            ranges,
            strict: false,
        }
    }

    /// A blacklist that allows everything
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set strict mode
    ///
    /// In strict mode destinations that do not parse, or whose host is not an
    /// IP literal, are rejected instead of allowed.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Configured ranges
    #[inline]
    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }

    /// Check if strict mode is enabled
    #[inline]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Check if no ranges are configured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check a single address against every range
    ///
    /// Transports use this to refuse consumers connecting from a forbidden
    /// address.
    #[inline]
    pub fn is_ip_allowed(&self, ip: IpAddr) -> bool {
        !self.ranges.iter().any(|range| range.contains(ip))
    }

    /// Validate a candidate destination URL
    ///
    /// Returns `true` when delivery to `url` is allowed.
    #[inline]
    pub fn validate(&self, url: &str) -> bool {
        self.check_url(url).is_ok()
    }

    /// Validate a candidate destination URL, explaining a rejection
    pub fn check_url(&self, url: &str) -> Result<()> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) if self.strict => return Err(RoutingError::invalid_url(url, e.to_string())),
            Err(e) => {
                debug!(url, error = %e, "destination does not parse, allowing");
                return Ok(());
            }
        };

        let ip = match host_ip(&parsed) {
            Ok(ip) => ip,
            Err(host) if self.strict => return Err(RoutingError::unresolved_host(host)),
            Err(host) => {
                debug!(url, host = %host, "destination host is not an IP literal, allowing");
                return Ok(());
            }
        };

        if self.is_ip_allowed(ip) {
            Ok(())
        } else {
            Err(RoutingError::blacklisted(url, ip))
        }
    }
}

/// Extract the host of `url` as an IP address, or return the host text
fn host_ip(url: &Url) -> std::result::Result<IpAddr, String> {
    url_host_ip(url).ok_or_else(|| url.host_str().unwrap_or_default().to_string())
}

/// The host of `url` as an IP address, if it denotes one
///
/// Non-special schemes such as `syslog://` and `tcp://` keep the host as
/// opaque text, including IPv4 shorthands (`127.1`, `2130706433`,
/// `0x7f.0.0.1`) that the system resolver still turns into addresses. Such
/// hosts are run through the WHATWG IPv4 parser used for `http` urls so they
/// are recognised as the address they resolve to.
pub fn url_host_ip(url: &Url) -> Option<IpAddr> {
    match url.host()? {
        Host::Ipv4(ip) => Some(IpAddr::V4(ip)),
        Host::Ipv6(ip) => Some(IpAddr::V6(ip)),
        Host::Domain(domain) => domain.parse().ok().or_else(|| ipv4_shorthand(domain)),
    }
}

fn ipv4_shorthand(domain: &str) -> Option<IpAddr> {
    let normalized = Url::parse(&format!("http://{domain}/")).ok()?;
    match normalized.host()? {
        Host::Ipv4(ip) => Some(IpAddr::V4(ip)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "blacklist_test.rs"]
mod tests;
