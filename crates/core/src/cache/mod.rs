//! Set-associative cache simulation with pluggable replacement policies,
//! plus a two-level wrapper over a pair of caches.

pub mod multi_level;
pub mod single;

pub use multi_level::{MultiLevelCache, MultiLevelStats};
pub use single::{Cache, CacheLine, CacheStats};

/// Line-replacement policy used when a set is full and a new tag must be
/// installed.
///
/// FIFO and LRU both select the line with the smallest `last_used` tick,
/// but only LRU refreshes `last_used` on a hit; FIFO's `last_used` reflects
/// install order only, never access order. LFU instead tracks a per-line
/// access frequency and evicts the least-frequently-used line, breaking
/// ties by install/access recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    #[default]
    Fifo,
    Lru,
    Lfu,
}
