//! Bounded admission counter.
//!
//! # Responsibilities
//! - Gate concurrent connections against a fixed maximum
//! - Keep `0 <= current <= maximum` under concurrent acquire/release
//! - Expose current and maximum for management queries
//!
//! # Design Decisions
//! - Single atomic, compare-and-swap on acquire: exactly one winner when one
//!   slot remains
//! - Unbounded counters still count, for observability only

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::observability::metrics;

/// Concurrency-safe counter bounded by an optional maximum.
#[derive(Debug)]
pub struct AdmissionCounter {
    current: AtomicUsize,
    maximum: Option<usize>,
}

impl AdmissionCounter {
    /// Create a counter. `None` means unbounded.
    pub fn new(maximum: Option<usize>) -> Self {
        Self {
            current: AtomicUsize::new(0),
            maximum,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Take one slot if `current < maximum`. Returns false and leaves the
    /// count untouched otherwise.
    pub fn try_acquire(&self) -> bool {
        let Some(maximum) = self.maximum else {
            self.current.fetch_add(1, Ordering::SeqCst);
            metrics::connection_admitted();
            return true;
        };

        let mut prev = self.current.load(Ordering::SeqCst);
        loop {
            if prev >= maximum {
                return false;
            }
            match self.current.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    metrics::connection_admitted();
                    return true;
                }
                Err(actual) => prev = actual,
            }
        }
    }

    /// Give back one slot. Never goes below zero.
    pub fn release(&self) {
        match self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1))
        {
            Ok(_) => metrics::connection_released(),
            Err(_) => tracing::warn!("Admission counter released with no active connections"),
        }
    }

    /// Current number of admitted, unreleased connections.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn maximum(&self) -> Option<usize> {
        self.maximum
    }
}
