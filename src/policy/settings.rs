//! Immutable policy settings assembled from configuration.

use thiserror::Error;

use crate::config::PolicyConfig;
use crate::policy::error::HostRangeError;
use crate::policy::host_range::HostRange;

/// A host-range token that failed to parse, with its position in
/// `allowed_hosts`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicySettingsError {
    #[error("allowed_hosts[{index}] '{token}': {source}")]
    InvalidHostRange {
        index: usize,
        token: String,
        #[source]
        source: HostRangeError,
    },
}

/// Connection ceiling plus host allow-list.
///
/// An empty `host_ranges` admits every address. Reconfiguration replaces the
/// whole value; it is never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySettings {
    /// `None` = unbounded.
    pub maximum_connections: Option<usize>,
    pub host_ranges: Vec<HostRange>,
}

impl PolicySettings {
    pub fn new(maximum_connections: Option<usize>, host_ranges: Vec<HostRange>) -> Self {
        Self {
            maximum_connections,
            host_ranges,
        }
    }

    /// Parse every token. The first bad token aborts; nothing is admitted on
    /// a partial rule set.
    pub fn from_tokens<S: AsRef<str>>(
        maximum_connections: Option<usize>,
        tokens: &[S],
    ) -> Result<Self, PolicySettingsError> {
        let host_ranges = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| {
                HostRange::parse(token.as_ref()).map_err(|source| {
                    PolicySettingsError::InvalidHostRange {
                        index,
                        token: token.as_ref().to_string(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(maximum_connections, host_ranges))
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self, PolicySettingsError> {
        Self::from_tokens(config.maximum_connections, config.allowed_hosts.as_slice())
    }
}
