//! Inclusive IP address ranges

use std::fmt;
use std::net::IpAddr;

use crate::error::{Result, RoutingError};

/// Closed interval of IP addresses
///
/// Both bounds are inclusive and belong to the same address family. A range
/// never contains an address of the other family.
///
/// # Example
///
/// ```
/// use plexus_routing::IpRange;
///
/// let range = IpRange::parse("127.0.0.0", "127.0.0.2").unwrap();
/// assert!(range.contains("127.0.0.2".parse().unwrap()));
/// assert!(!range.contains("127.0.0.3".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    start: IpAddr,
    end: IpAddr,
}

impl IpRange {
    /// Create a range from parsed bounds
    pub fn new(start: IpAddr, end: IpAddr) -> Result<Self> {
        if start.is_ipv4() != end.is_ipv4() {
            return Err(RoutingError::invalid_range(
                start.to_string(),
                end.to_string(),
                "bounds are of different address families",
            ));
        }
        if start > end {
            return Err(RoutingError::invalid_range(
                start.to_string(),
                end.to_string(),
                "start is after end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from textual bounds
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_ip(start)?;
        let end = parse_ip(end)?;
        Self::new(start, end)
    }

    /// A range containing exactly one address
    #[inline]
    pub fn single(ip: IpAddr) -> Self {
        Self { start: ip, end: ip }
    }

    /// Lower bound (inclusive)
    #[inline]
    pub fn start(&self) -> IpAddr {
        self.start
    }

    /// Upper bound (inclusive)
    #[inline]
    pub fn end(&self) -> IpAddr {
        self.end
    }

    /// Check whether `ip` lies within `[start, end]`
    #[inline]
    pub fn contains(&self, ip: IpAddr) -> bool {
        ip.is_ipv4() == self.start.is_ipv4() && self.start <= ip && ip <= self.end
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn parse_ip(value: &str) -> Result<IpAddr> {
    value
        .trim()
        .parse()
        .map_err(|_| RoutingError::invalid_address(value))
}
