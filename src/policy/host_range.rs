//! Host-range rules and their textual grammar.
//!
//! # Grammar
//! ```text
//! "*"               wildcard, every address of every supported family
//! "<addr>"          one IPv4 or IPv6 literal
//! "<addr>,<addr>"   inclusive interval, same family, low <= high
//! ```
//! Whitespace around each endpoint is ignored. Any other comma count, a
//! family mismatch, or an inverted interval is a configuration error.

use std::fmt;
use std::str::FromStr;

use crate::policy::address::{has_ipv6_support, AddressFamily, AddressValue};
use crate::policy::error::HostRangeError;

const WILDCARD: &str = "*";

/// A parsed allow-list rule.
///
/// Intervals are validated on construction, so a stored interval always
/// has same-family endpoints with `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRange(Rule);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Single(AddressValue),
    Interval { low: AddressValue, high: AddressValue },
    WildcardAll,
}

impl HostRange {
    /// Parse one configuration token.
    pub fn parse(token: &str) -> Result<Self, HostRangeError> {
        let token = token.trim();
        if token == WILDCARD {
            return Ok(Self::wildcard());
        }

        let endpoints: Vec<&str> = token.split(',').map(str::trim).collect();
        match endpoints.as_slice() {
            [single] => Ok(Self::single(single.parse()?)),
            [low, high] => Self::interval(low.parse()?, high.parse()?),
            _ => Err(HostRangeError::ArgumentCount {
                input: token.to_string(),
                count: endpoints.len(),
            }),
        }
    }

    pub fn single(addr: AddressValue) -> Self {
        Self(Rule::Single(addr))
    }

    /// Build an inclusive interval. Equal endpoints are allowed and match
    /// exactly that one address.
    pub fn interval(low: AddressValue, high: AddressValue) -> Result<Self, HostRangeError> {
        if !low.same_family(&high) {
            return Err(HostRangeError::MixedFamily { low, high });
        }
        if low > high {
            return Err(HostRangeError::InvertedRange { low, high });
        }
        Ok(Self(Rule::Interval { low, high }))
    }

    pub fn wildcard() -> Self {
        Self(Rule::WildcardAll)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.0, Rule::WildcardAll)
    }

    /// Inclusive bounds of the rule, `None` for the wildcard.
    pub fn bounds(&self) -> Option<(AddressValue, AddressValue)> {
        match self.0 {
            Rule::Single(addr) => Some((addr, addr)),
            Rule::Interval { low, high } => Some((low, high)),
            Rule::WildcardAll => None,
        }
    }

    /// Returns true if `candidate` is covered by this rule.
    pub fn matches(&self, candidate: &AddressValue) -> bool {
        match &self.0 {
            Rule::WildcardAll => match candidate.family() {
                AddressFamily::Ipv4 => true,
                AddressFamily::Ipv6 => has_ipv6_support(),
            },
            Rule::Single(addr) => addr == candidate,
            Rule::Interval { low, high } => {
                candidate.same_family(low) && low <= candidate && candidate <= high
            }
        }
    }

    /// Textual variant of [`HostRange::matches`]. Unparsable input never
    /// matches.
    pub fn matches_str(&self, candidate: &str) -> bool {
        match candidate.trim().parse::<AddressValue>() {
            Ok(addr) => self.matches(&addr),
            Err(_) => false,
        }
    }
}

impl FromStr for HostRange {
    type Err = HostRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the canonical configuration token.
impl fmt::Display for HostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Rule::Single(addr) => write!(f, "{}", addr),
            Rule::Interval { low, high } => write!(f, "{},{}", low, high),
            Rule::WildcardAll => f.write_str(WILDCARD),
        }
    }
}
