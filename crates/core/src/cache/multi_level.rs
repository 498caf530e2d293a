//! Two-level cache wrapper: probe L1, then L2 on an L1 miss, with no
//! write-back or promotion on an L2 hit.

use super::single::Cache;
use crate::util::percent;

#[cfg(feature = "logging")]
use tracing::debug;

/// Which level, if any, satisfied an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    L1Hit,
    L2Hit,
    Miss,
}

/// Aggregate statistics reported by [`MultiLevelCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiLevelStats {
    pub l1_hits: u64,
    pub l1_misses: u64,
    pub l2_hits: u64,
    pub l2_misses: u64,
    pub l1_hit_ratio_percent: f64,
    pub l2_hit_ratio_percent: f64,
}

/// A two-level cache: every access probes L1 first, falls back to L2 on
/// an L1 miss, and only advances the shared clock when both levels miss.
///
/// Unlike [`Cache::stats`], which derives its counts from the `freq` of
/// currently-valid lines, this wrapper keeps its own running `l1_hits` /
/// `l1_misses` / `l2_hits` / `l2_misses` counters, tracking per-level hit/miss
/// totals independently of each `Cache`'s own internal bookkeeping.
///
/// Each level's own `Cache::access` is called in turn, and each is a full
/// hit-or-install operation in its own right: an L1 miss always installs a
/// fresh line into L1 (via L1's own victim selection) whether or not L2
/// subsequently hits. Nothing is ever copied from L2 into L1 on an L2 hit —
/// there is no write-back or promotion path — which is a deliberately kept
/// simplification rather than a real hardware cache's inclusive policy.
#[derive(Debug, Clone)]
pub struct MultiLevelCache {
    l1: Cache,
    l2: Cache,
    time: u64,
    l1_hits: u64,
    l1_misses: u64,
    l2_hits: u64,
    l2_misses: u64,
}

impl MultiLevelCache {
    #[must_use]
    pub fn new(l1: Cache, l2: Cache) -> Self {
        Self {
            l1,
            l2,
            time: 0,
            l1_hits: 0,
            l1_misses: 0,
            l2_hits: 0,
            l2_misses: 0,
        }
    }

    #[must_use]
    pub fn l1(&self) -> &Cache {
        &self.l1
    }

    #[must_use]
    pub fn l2(&self) -> &Cache {
        &self.l2
    }

    #[must_use]
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Access `address`, probing L1 then L2. Each level's own `access` runs
    /// to completion (hit, or miss-and-install) regardless of the other
    /// level's outcome. The shared clock advances by one tick only when
    /// both levels miss.
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        if self.l1.access(address, self.time) {
            self.l1_hits += 1;

            #[cfg(feature = "logging")]
            debug!(address, "multi-level cache L1 hit");

            return AccessOutcome::L1Hit;
        }
        self.l1_misses += 1;

        if self.l2.access(address, self.time) {
            self.l2_hits += 1;

            #[cfg(feature = "logging")]
            debug!(address, "multi-level cache L2 hit (not promoted to L1)");

            return AccessOutcome::L2Hit;
        }
        self.l2_misses += 1;
        self.time += 1;

        #[cfg(feature = "logging")]
        debug!(address, time = self.time, "multi-level cache double miss");

        AccessOutcome::Miss
    }

    /// Compute the current statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> MultiLevelStats {
        let total_l1 = self.l1_hits + self.l1_misses;
        let total_l2 = self.l2_hits + self.l2_misses;

        MultiLevelStats {
            l1_hits: self.l1_hits,
            l1_misses: self.l1_misses,
            l2_hits: self.l2_hits,
            l2_misses: self.l2_misses,
            l1_hit_ratio_percent: percent(self.l1_hits, total_l1),
            l2_hit_ratio_percent: percent(self.l2_hits, total_l2),
        }
    }
}
