//! Admission decisions for inbound connections.
//!
//! # Responsibilities
//! - Check the peer against the host allow-list
//! - Take an admission slot for allowed peers
//! - Hand out permits that give the slot back when the connection closes
//! - Keep per-decision statistics for management queries
//!
//! # Design Decisions
//! - Host check runs before the counter, so disallowed peers never hold a
//!   slot, even briefly
//! - The rule set is swapped whole on reload (`ArcSwap`); evaluation takes a
//!   lock-free snapshot
//! - The counter maximum is fixed for the life of the engine

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::observability::metrics;
use crate::policy::address::{has_ipv6_support, AddressValue};
use crate::policy::counter::AdmissionCounter;
use crate::policy::error::DenyReason;
use crate::policy::host_range::HostRange;
use crate::policy::settings::PolicySettings;

/// Outcome of [`PolicyEngine::evaluate`].
#[derive(Debug)]
#[must_use = "an admitted connection holds a slot until its permit is dropped"]
pub enum Decision {
    Admit(AdmissionPermit),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Admit(_) => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    pub fn into_permit(self) -> Result<AdmissionPermit, DenyReason> {
        match self {
            Decision::Admit(permit) => Ok(permit),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// One admitted connection's slot.
///
/// Released exactly once: either through [`AdmissionPermit::release`] or
/// when dropped. Both consume the permit, so a second release cannot be
/// expressed.
#[derive(Debug)]
pub struct AdmissionPermit {
    counter: Arc<AdmissionCounter>,
}

impl AdmissionPermit {
    pub fn release(self) {}
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.counter.release();
    }
}

#[derive(Debug, Default)]
struct DecisionStats {
    processed: AtomicU64,
    host_denials: AtomicU64,
    limit_denials: AtomicU64,
}

/// Read-only view of the engine for management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
    pub maximum_connections: Option<usize>,
    pub connections_current: usize,
    pub connections_processed: u64,
    pub connections_denied: u64,
    pub host_denials: u64,
    pub limit_denials: u64,
    pub host_ranges: Vec<String>,
    pub ipv6_supported: bool,
}

/// Host allow-list plus admission counter.
///
/// Shared by reference (`Arc<PolicyEngine>`) with every accept task.
#[derive(Debug)]
pub struct PolicyEngine {
    rules: ArcSwap<Vec<HostRange>>,
    counter: Arc<AdmissionCounter>,
    stats: DecisionStats,
}

impl PolicyEngine {
    pub fn new(settings: PolicySettings) -> Self {
        Self {
            rules: ArcSwap::from_pointee(settings.host_ranges),
            counter: Arc::new(AdmissionCounter::new(settings.maximum_connections)),
            stats: DecisionStats::default(),
        }
    }

    /// Decide whether a connection from `peer` may proceed.
    pub fn evaluate(&self, peer: &AddressValue) -> Decision {
        self.stats.processed.fetch_add(1, Ordering::Relaxed);

        if !self.host_allowed(peer) {
            self.stats.host_denials.fetch_add(1, Ordering::Relaxed);
            metrics::record_decision(DenyReason::HostNotAllowed.as_str());
            return Decision::Deny(DenyReason::HostNotAllowed);
        }

        if !self.counter.try_acquire() {
            self.stats.limit_denials.fetch_add(1, Ordering::Relaxed);
            metrics::record_decision(DenyReason::ConnectionLimitExceeded.as_str());
            return Decision::Deny(DenyReason::ConnectionLimitExceeded);
        }

        metrics::record_decision("admitted");
        Decision::Admit(AdmissionPermit {
            counter: Arc::clone(&self.counter),
        })
    }

    /// [`PolicyEngine::evaluate`] for a socket peer IP. IPv4-mapped IPv6
    /// peers are evaluated as IPv4.
    pub fn evaluate_ip(&self, ip: IpAddr) -> Decision {
        self.evaluate(&AddressValue::from(ip.to_canonical()))
    }

    fn host_allowed(&self, peer: &AddressValue) -> bool {
        let rules = self.rules.load();
        rules.is_empty() || rules.iter().any(|range| range.matches(peer))
    }

    /// Replace the host allow-list. The counter and its maximum are kept;
    /// returns false if `settings` asked for a different maximum, which is
    /// not applied.
    pub fn reload(&self, settings: PolicySettings) -> bool {
        let count = settings.host_ranges.len();
        self.rules.store(Arc::new(settings.host_ranges));
        tracing::info!(host_ranges = count, "Policy host ranges reloaded");

        if settings.maximum_connections != self.counter.maximum() {
            tracing::warn!(
                configured = ?settings.maximum_connections,
                active = ?self.counter.maximum(),
                "maximum_connections change requires a restart; keeping active limit"
            );
            return false;
        }
        true
    }

    pub fn connections_current(&self) -> usize {
        self.counter.current()
    }

    pub fn maximum_connections(&self) -> Option<usize> {
        self.counter.maximum()
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        let host_denials = self.stats.host_denials.load(Ordering::Relaxed);
        let limit_denials = self.stats.limit_denials.load(Ordering::Relaxed);
        PolicySnapshot {
            maximum_connections: self.counter.maximum(),
            connections_current: self.counter.current(),
            connections_processed: self.stats.processed.load(Ordering::Relaxed),
            connections_denied: host_denials + limit_denials,
            host_denials,
            limit_denials,
            host_ranges: self.rules.load().iter().map(ToString::to_string).collect(),
            ipv6_supported: has_ipv6_support(),
        }
    }
}
