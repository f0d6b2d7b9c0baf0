//! Atomic decision counters.
//!
//! Lock-free counters for locate volume and fallback reasons. All atomics
//! use `Relaxed` ordering; these are monotonic display counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::locate::Ineligible;

struct StatsInner {
    locates: AtomicU64,
    local_redirects: AtomicU64,
    delegates: AtomicU64,
    fallbacks: [AtomicU64; Ineligible::ALL.len()],
}

/// Thread-safe decision statistics. Cheap to clone (Arc).
#[derive(Clone)]
pub struct DecisionStats {
    inner: Arc<StatsInner>,
}

/// Snapshot of current counter values, serializable to JSON.
#[derive(Debug, Serialize)]
pub struct StatsSnapshot {
    pub locates: u64,
    pub local_redirects: u64,
    pub delegates: u64,
    /// Delegations by reason.
    pub fallbacks: BTreeMap<&'static str, u64>,
}

impl DecisionStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatsInner {
                locates: AtomicU64::new(0),
                local_redirects: AtomicU64::new(0),
                delegates: AtomicU64::new(0),
                fallbacks: std::array::from_fn(|_| AtomicU64::new(0)),
            }),
        }
    }

    pub fn record_local_redirect(&self) {
        self.inner.locates.fetch_add(1, Ordering::Relaxed);
        self.inner.local_redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delegate(&self, reason: Ineligible) {
        self.inner.locates.fetch_add(1, Ordering::Relaxed);
        self.inner.delegates.fetch_add(1, Ordering::Relaxed);
        self.inner.fallbacks[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            locates: self.inner.locates.load(Ordering::Relaxed),
            local_redirects: self.inner.local_redirects.load(Ordering::Relaxed),
            delegates: self.inner.delegates.load(Ordering::Relaxed),
            fallbacks: Ineligible::ALL
                .iter()
                .map(|reason| {
                    let count = self.inner.fallbacks[reason.index()].load(Ordering::Relaxed);
                    (reason.as_str(), count)
                })
                .collect(),
        }
    }
}

impl Default for DecisionStats {
    fn default() -> Self {
        Self::new()
    }
}
