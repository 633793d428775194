//! IPv4 address validation for DNS answer data.

use std::fmt;
use std::net::Ipv4Addr;

/// Returns true iff `candidate` is a dotted quad with four octets in `0..=255`
/// and nothing else around it.
pub fn is_valid_ipv4(candidate: &str) -> bool {
    ResolvedAddress::parse(candidate).is_some()
}

/// An IPv4 address taken from a DNS answer record.
///
/// Only constructible through [`ResolvedAddress::parse`], so holding one
/// means the answer data passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress(Ipv4Addr);

impl ResolvedAddress {
    pub fn parse(candidate: &str) -> Option<Self> {
        candidate.parse().ok().map(Self)
    }

    #[inline]
    pub const fn ip(&self) -> Ipv4Addr {
        self.0
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
