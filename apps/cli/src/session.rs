//! Mutable state threaded through a REPL session.

use allocsim_core::allocator::{BuddyAllocator, PartitionAllocator};
use allocsim_core::cache::{Cache, MultiLevelCache, ReplacementPolicy};

/// The default L1/L2 configuration the simulator starts with.
fn default_cache() -> MultiLevelCache {
    let l1 = Cache::new(256, 64, 1, ReplacementPolicy::Fifo).expect("default L1 config is valid");
    let l2 = Cache::new(1024, 64, 4, ReplacementPolicy::Lru).expect("default L2 config is valid");
    MultiLevelCache::new(l1, l2)
}

/// All simulator state for one REPL session.
///
/// The partition allocator always exists: before `init memory` is run it
/// simply has zero total bytes, so every `malloc` fails until initialized.
/// The buddy allocator, by contrast, starts absent and is only created by
/// `buddy_init`.
pub struct Session {
    pub partition: PartitionAllocator,
    pub buddy: Option<BuddyAllocator>,
    pub cache: MultiLevelCache,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            partition: PartitionAllocator::new(0),
            buddy: None,
            cache: default_cache(),
        }
    }
}
