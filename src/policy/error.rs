//! Policy error taxonomy.

use std::fmt;

use thiserror::Error;

use crate::policy::address::AddressValue;

/// Reasons a host-range token is rejected at configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostRangeError {
    /// Not a numeric IPv4 or IPv6 literal.
    #[error("malformed host address '{input}'")]
    MalformedAddress { input: String },

    #[error("host range '{low},{high}' mixes {} and {} endpoints", .low.family(), .high.family())]
    MixedFamily { low: AddressValue, high: AddressValue },

    #[error("host range '{low},{high}' is inverted: low endpoint sorts after high endpoint")]
    InvertedRange { low: AddressValue, high: AddressValue },

    /// A range has exactly one or two endpoints.
    #[error("host range '{input}' has {count} endpoints, expected one or two")]
    ArgumentCount { input: String, count: usize },
}

/// Why a connection was denied. Never sent to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    HostNotAllowed,
    ConnectionLimitExceeded,
}

impl DenyReason {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::HostNotAllowed => "host_not_allowed",
            DenyReason::ConnectionLimitExceeded => "connection_limit_exceeded",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
