//! Addresses for single listeners and for the aggregate.
//!
//! [`EndpointAddr`] names one member: a network tag plus a free-form
//! address string, so socket addresses, onion hostnames, and garlic
//! destinations all fit. [`MetaAddr`] enumerates the members of a meta
//! listener under the network name `meta`.

use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;

/// Address of one managed listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointAddr {
    network: Cow<'static, str>,
    addr: String,
}

impl EndpointAddr {
    /// Creates an address with an arbitrary network tag.
    pub fn new(network: impl Into<Cow<'static, str>>, addr: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            addr: addr.into(),
        }
    }

    /// A TCP socket address.
    pub fn tcp(addr: SocketAddr) -> Self {
        Self::new("tcp", addr.to_string())
    }

    /// A Tor onion-service address.
    pub fn onion(addr: impl Into<String>) -> Self {
        Self::new("onion", addr)
    }

    /// An I2P garlic destination.
    pub fn garlic(addr: impl Into<String>) -> Self {
        Self::new("garlic", addr)
    }

    /// The network this address belongs to (`tcp`, `onion`, `garlic`, …).
    pub fn network(&self) -> &str {
        &self.network
    }

    /// The address string itself.
    pub fn as_str(&self) -> &str {
        &self.addr
    }
}

impl fmt::Display for EndpointAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}

/// Composite address of a meta listener: the addresses of every member.
#[derive(Clone, Debug, Default)]
pub struct MetaAddr {
    members: Vec<EndpointAddr>,
}

impl MetaAddr {
    /// Builds a composite address from member addresses.
    pub fn new(members: Vec<EndpointAddr>) -> Self {
        Self { members }
    }

    /// The name of the network.
    pub fn network(&self) -> &'static str {
        "meta"
    }

    /// The member addresses, in registry snapshot order.
    pub fn members(&self) -> &[EndpointAddr] {
        &self.members
    }
}

impl fmt::Display for MetaAddr {
    /// Formats as `meta(<member>, <member>, …)`, or `meta(empty)` when no
    /// listeners are registered.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.members.is_empty() {
            return f.write_str("meta(empty)");
        }
        f.write_str("meta(")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{member}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_addr_formats_members_in_order() {
        let empty = MetaAddr::default();
        assert_eq!(empty.to_string(), "meta(empty)");
        assert_eq!(empty.network(), "meta");

        let addr = MetaAddr::new(vec![
            EndpointAddr::tcp("127.0.0.1:3000".parse().unwrap()),
            EndpointAddr::onion("abcdef.onion:443"),
        ]);
        assert_eq!(addr.to_string(), "meta(127.0.0.1:3000, abcdef.onion:443)");
    }
}
