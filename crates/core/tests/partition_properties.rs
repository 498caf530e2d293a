//! Property tests for the variable-partition allocator's structural
//! invariants under arbitrary alloc/free sequences.

use allocsim_core::allocator::{PartitionAllocator, PlacementPolicy};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Alloc(u64),
    Free(usize), // index into the list of still-live ids, modulo its length
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..=512).prop_map(Op::Alloc),
        (0usize..64).prop_map(Op::Free),
    ]
}

fn assert_invariants(alloc: &PartitionAllocator) {
    let blocks = alloc.blocks();
    assert!(!blocks.is_empty(), "there is always at least one block");

    // Ordered by start, contiguous, covering exactly [0, total).
    let mut expected_start = 0u64;
    for b in blocks {
        assert_eq!(b.start, expected_start, "blocks must be contiguous");
        expected_start += b.size;
    }
    assert_eq!(expected_start, alloc.total_memory(), "blocks must cover the full space");

    // No two adjacent free blocks (coalescing must be exhaustive).
    for pair in blocks.windows(2) {
        assert!(!(pair[0].free && pair[1].free), "adjacent free blocks must be coalesced");
    }

    // Used-block ids are unique and positive; free blocks carry id == -1.
    let mut used_ids: Vec<i64> = blocks.iter().filter(|b| !b.free).map(|b| b.id).collect();
    let before = used_ids.len();
    used_ids.sort_unstable();
    used_ids.dedup();
    assert_eq!(used_ids.len(), before, "used block ids must be unique");
    for b in blocks {
        if b.free {
            assert_eq!(b.id, -1);
        } else {
            assert!(b.id > 0);
        }
    }
}

proptest! {
    #[test]
    fn invariants_hold_after_arbitrary_sequences(
        total in 256u64..=4096,
        ops in prop::collection::vec(op_strategy(), 0..200),
        policy_pick in 0u8..3,
    ) {
        let policy = match policy_pick {
            0 => PlacementPolicy::FirstFit,
            1 => PlacementPolicy::BestFit,
            _ => PlacementPolicy::WorstFit,
        };
        let mut alloc = PartitionAllocator::new(total);
        alloc.set_policy(policy);
        let mut live: Vec<i64> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(size) => {
                    if let Ok(id) = alloc.allocate(size) {
                        live.push(id);
                    }
                }
                Op::Free(idx) => {
                    if !live.is_empty() {
                        let id = live.remove(idx % live.len());
                        alloc.free(id).unwrap();
                    }
                }
            }
            assert_invariants(&alloc);
        }
    }

    #[test]
    fn freeing_everything_recombines_to_a_single_block(
        total in 256u64..=4096,
        sizes in prop::collection::vec(1u64..=200, 0..16),
    ) {
        let mut alloc = PartitionAllocator::new(total);
        let mut ids = Vec::new();
        for size in sizes {
            if let Ok(id) = alloc.allocate(size) {
                ids.push(id);
            }
        }
        for id in ids {
            alloc.free(id).unwrap();
        }

        let blocks = alloc.blocks();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].free);
        assert_eq!(blocks[0].size, total);
    }
}
