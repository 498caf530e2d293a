//! Allocation engines: a variable-partition allocator and a buddy allocator.
//!
//! Both engines operate purely on metadata describing a pretend address
//! space — no real memory is ever touched.

pub mod buddy;
pub mod partition;

pub use buddy::{BuddyAllocator, BuddyBlock, BuddyStats};
pub use partition::{Block, PartitionAllocator, PartitionStats};

/// Placement policy used by the partition allocator to choose among
/// candidate free blocks during allocation.
///
/// Only the three variable-partition strategies are represented here; the
/// buddy allocator has its own splitting rule and needs no placement policy
/// of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementPolicy {
    /// Use the first free block large enough to satisfy the request.
    #[default]
    FirstFit,
    /// Use the smallest free block large enough to satisfy the request.
    BestFit,
    /// Use the largest free block large enough to satisfy the request.
    WorstFit,
}

/// Fixed alignment (bytes) applied to every partition-allocator request.
pub const PARTITION_ALIGN: u64 = 16;
