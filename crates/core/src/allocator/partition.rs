//! Variable-partition allocator with first/best/worst-fit placement and
//! bidirectional coalescing on free.

use super::{PlacementPolicy, PARTITION_ALIGN};
use crate::error::{SimError, SimResult};
use crate::util::{align_up, external_fragmentation_percent, percent};

#[cfg(feature = "logging")]
use tracing::debug;

/// A single partition of the address space.
///
/// `id == -1` iff the block is free. `requested`/`internal_frag` are
/// meaningless for free blocks and are cleared to `0` by [`PartitionAllocator::free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: u64,
    pub size: u64,
    pub free: bool,
    pub id: i64,
    pub requested: u64,
    pub internal_frag: u64,
}

impl Block {
    const fn free_block(start: u64, size: u64) -> Self {
        Self {
            start,
            size,
            free: true,
            id: -1,
            requested: 0,
            internal_frag: 0,
        }
    }

    /// Inclusive end offset of this block (`start + size - 1`), or `start`
    /// when `size == 0`.
    #[must_use]
    pub fn end_inclusive(&self) -> u64 {
        self.start + self.size.saturating_sub(1)
    }
}

/// Aggregate statistics reported by [`PartitionAllocator::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub utilization_percent: f64,
    pub internal_fragmentation: u64,
    pub external_fragmentation_percent: f64,
    pub alloc_success: u64,
    pub alloc_fail: u64,
    pub total_requests: u64,
    pub success_rate_percent: f64,
    pub failure_rate_percent: f64,
}

/// Variable-partition (first/best/worst-fit) allocator over a pretend,
/// contiguous byte address space.
#[derive(Debug, Clone)]
pub struct PartitionAllocator {
    total_memory: u64,
    policy: PlacementPolicy,
    blocks: Vec<Block>,
    next_id: i64,
    alloc_success: u64,
    alloc_fail: u64,
    internal_frag: u64,
}

impl PartitionAllocator {
    /// Create a new allocator over `total` bytes, equivalent to
    /// constructing and immediately calling [`Self::init`].
    #[must_use]
    pub fn new(total: u64) -> Self {
        let mut this = Self {
            total_memory: 0,
            policy: PlacementPolicy::default(),
            blocks: Vec::new(),
            next_id: 1,
            alloc_success: 0,
            alloc_fail: 0,
            internal_frag: 0,
        };
        this.init(total);
        this
    }

    /// Reset to a single free block spanning `[0, total)`, clearing every
    /// counter and all previously assigned ids.
    pub fn init(&mut self, total: u64) {
        self.total_memory = total;
        self.blocks = vec![Block::free_block(0, total)];
        self.next_id = 1;
        self.alloc_success = 0;
        self.alloc_fail = 0;
        self.internal_frag = 0;

        #[cfg(feature = "logging")]
        debug!(total_memory = total, "partition allocator initialized");
    }

    /// Switch the placement policy used by subsequent allocations.
    pub fn set_policy(&mut self, policy: PlacementPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    #[must_use]
    pub fn total_memory(&self) -> u64 {
        self.total_memory
    }

    /// The block sequence, ordered by ascending `start`.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn find_candidate(&self, actual: u64) -> Option<usize> {
        match self.policy {
            PlacementPolicy::FirstFit => self
                .blocks
                .iter()
                .position(|b| b.free && b.size >= actual),
            PlacementPolicy::BestFit => self
                .blocks
                .iter()
                .enumerate()
                .filter(|(_, b)| b.free && b.size >= actual)
                .min_by_key(|(idx, b)| (b.size, *idx))
                .map(|(idx, _)| idx),
            PlacementPolicy::WorstFit => self
                .blocks
                .iter()
                .enumerate()
                .filter(|(_, b)| b.free && b.size >= actual)
                .max_by_key(|(idx, b)| (b.size, core::cmp::Reverse(*idx)))
                .map(|(idx, _)| idx),
        }
    }

    /// Allocate `requested` bytes (rounded up to a 16-byte boundary) under
    /// the current placement policy.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] when no free block is large
    /// enough; `alloc_fail` is incremented either way.
    pub fn allocate(&mut self, requested: u64) -> SimResult<i64> {
        let actual = align_up(requested, PARTITION_ALIGN);

        let Some(idx) = self.find_candidate(actual) else {
            self.alloc_fail += 1;
            return Err(SimError::allocation_failed(requested));
        };

        let chosen = self.blocks[idx];
        if chosen.size > actual {
            let remainder = Block::free_block(chosen.start + actual, chosen.size - actual);
            self.blocks.insert(idx + 1, remainder);
        }

        let id = self.next_id;
        self.next_id += 1;

        let internal_frag = actual - requested;
        self.blocks[idx] = Block {
            start: chosen.start,
            size: actual,
            free: false,
            id,
            requested,
            internal_frag,
        };
        self.internal_frag += internal_frag;
        self.alloc_success += 1;

        #[cfg(feature = "logging")]
        debug!(id, requested, actual, "partition block allocated");

        Ok(id)
    }

    /// Free the block with the given `id`, coalescing with an adjacent free
    /// neighbor on each side.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBlockId`] if no used block has this id;
    /// state is unchanged in that case.
    pub fn free(&mut self, id: i64) -> SimResult<()> {
        let Some(idx) = self
            .blocks
            .iter()
            .position(|b| !b.free && b.id == id)
        else {
            return Err(SimError::invalid_block_id(id));
        };

        self.blocks[idx].free = true;
        self.blocks[idx].id = -1;
        self.blocks[idx].requested = 0;
        self.blocks[idx].internal_frag = 0;

        // Coalesce forward.
        if idx + 1 < self.blocks.len() && self.blocks[idx + 1].free {
            self.blocks[idx].size += self.blocks[idx + 1].size;
            self.blocks.remove(idx + 1);
        }

        // Coalesce backward.
        if idx > 0 && self.blocks[idx - 1].free {
            self.blocks[idx - 1].size += self.blocks[idx].size;
            self.blocks.remove(idx);
        }

        #[cfg(feature = "logging")]
        debug!(id, "partition block freed");

        Ok(())
    }

    /// Compute the current statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> PartitionStats {
        let mut used = 0u64;
        let mut free = 0u64;
        let mut largest_free = 0u64;

        for b in &self.blocks {
            if b.free {
                free += b.size;
                largest_free = largest_free.max(b.size);
            } else {
                used += b.size;
            }
        }

        let total_requests = self.alloc_success + self.alloc_fail;

        PartitionStats {
            total: self.total_memory,
            used,
            free,
            utilization_percent: percent(used, self.total_memory),
            internal_fragmentation: self.internal_frag,
            external_fragmentation_percent: external_fragmentation_percent(free, largest_free),
            alloc_success: self.alloc_success,
            alloc_fail: self.alloc_fail,
            total_requests,
            success_rate_percent: percent(self.alloc_success, total_requests),
            failure_rate_percent: percent(self.alloc_fail, total_requests),
        }
    }
}
