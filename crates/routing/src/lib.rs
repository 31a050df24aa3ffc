//! Plexus Routing - identifiers and destination policy
//!
//! - `SinkId` / `ShardId` - identities used by the sink registry
//! - `IpRange` - closed interval of addresses
//! - `Blacklist` - rejects destinations inside forbidden ranges
//!
//! # Example
//!
//! ```
//! use plexus_routing::{Blacklist, IpRange};
//!
//! let blacklist = Blacklist::new(vec![IpRange::parse("10.0.0.0", "10.255.255.255").unwrap()]);
//! assert!(!blacklist.validate("syslog://10.1.2.3:514"));
//! assert!(blacklist.validate("syslog://192.0.2.10:514"));
//! ```

mod blacklist;
mod error;
mod ip_range;
mod sink_id;

pub use blacklist::{Blacklist, url_host_ip};
pub use error::{Result, RoutingError};
pub use ip_range::IpRange;
pub use sink_id::{ShardId, SinkId};
