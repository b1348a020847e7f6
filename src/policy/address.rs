//! Normalized numeric host addresses.
//!
//! Only literal numeric addresses are accepted. Names are never resolved,
//! so anything that is not a dotted-quad or colon-hex literal is malformed.

use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::policy::error::HostRangeError;

/// Whether IPv6 literals and IPv6 peers are supported by this build.
pub const fn has_ipv6_support() -> bool {
    cfg!(feature = "ipv6")
}

/// Address family of an [`AddressValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => f.write_str("IPv4"),
            AddressFamily::Ipv6 => f.write_str("IPv6"),
        }
    }
}

/// An IPv4 or IPv6 address as big-endian octets.
///
/// Values of the same family order as unsigned integers of their width.
/// Values of different families are unordered: `partial_cmp` returns `None`,
/// so `<=` between families is always false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressValue {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl AddressValue {
    /// Parse a numeric address literal.
    pub fn parse(input: &str) -> Result<Self, HostRangeError> {
        input.parse()
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            AddressValue::V4(_) => AddressFamily::Ipv4,
            AddressValue::V6(_) => AddressFamily::Ipv6,
        }
    }

    pub fn octets(&self) -> &[u8] {
        match self {
            AddressValue::V4(bytes) => bytes.as_slice(),
            AddressValue::V6(bytes) => bytes.as_slice(),
        }
    }

    pub fn same_family(&self, other: &AddressValue) -> bool {
        self.family() == other.family()
    }
}

impl PartialOrd for AddressValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (AddressValue::V4(a), AddressValue::V4(b)) => Some(a.cmp(b)),
            (AddressValue::V6(a), AddressValue::V6(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl FromStr for AddressValue {
    type Err = HostRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(v4) = s.parse::<Ipv4Addr>() {
            return Ok(AddressValue::V4(v4.octets()));
        }
        if has_ipv6_support() {
            if let Ok(v6) = s.parse::<Ipv6Addr>() {
                return Ok(AddressValue::V6(v6.octets()));
            }
        }
        Err(HostRangeError::MalformedAddress {
            input: s.to_string(),
        })
    }
}

impl From<IpAddr> for AddressValue {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => AddressValue::V4(v4.octets()),
            IpAddr::V6(v6) => AddressValue::V6(v6.octets()),
        }
    }
}

impl From<AddressValue> for IpAddr {
    fn from(value: AddressValue) -> Self {
        match value {
            AddressValue::V4(bytes) => IpAddr::V4(Ipv4Addr::from(bytes)),
            AddressValue::V6(bytes) => IpAddr::V6(Ipv6Addr::from(bytes)),
        }
    }
}

impl fmt::Display for AddressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&IpAddr::from(*self), f)
    }
}
