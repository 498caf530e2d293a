//! Property tests for the set-associative cache's structural invariants.

use allocsim_core::cache::{Cache, ReplacementPolicy};
use proptest::prelude::*;

fn policy_strategy() -> impl Strategy<Value = ReplacementPolicy> {
    prop_oneof![
        Just(ReplacementPolicy::Fifo),
        Just(ReplacementPolicy::Lru),
        Just(ReplacementPolicy::Lfu),
    ]
}

// `total_size` is chosen as an exact multiple of `block_size * associativity`
// so the derived `num_sets` matches what the test asserts against.
fn total_size_for(num_sets: usize, associativity: usize, block_size: u64) -> u64 {
    num_sets as u64 * associativity as u64 * block_size
}

proptest! {
    #[test]
    fn every_set_always_has_exactly_associativity_lines(
        num_sets in 1usize..=8,
        associativity in 1usize..=8,
        block_size in 1u64..=64,
        policy in policy_strategy(),
        addresses in prop::collection::vec(0u64..=4096, 0..200),
    ) {
        let total_size = total_size_for(num_sets, associativity, block_size);
        let mut cache = Cache::new(total_size, block_size, associativity, policy).unwrap();
        prop_assert_eq!(cache.num_sets(), num_sets);
        for (i, addr) in addresses.iter().enumerate() {
            cache.access(*addr, i as u64 + 1);
            for set in cache.sets() {
                prop_assert_eq!(set.len(), associativity);
            }
        }
    }

    #[test]
    fn a_hit_never_invalidates_the_line_it_hits(
        num_sets in 1usize..=8,
        associativity in 1usize..=8,
        block_size in 1u64..=64,
        policy in policy_strategy(),
        addr in 0u64..=4096,
        repeats in 1usize..=20,
    ) {
        let total_size = total_size_for(num_sets, associativity, block_size);
        let mut cache = Cache::new(total_size, block_size, associativity, policy).unwrap();
        cache.access(addr, 1); // install
        for t in 0..repeats {
            let hit = cache.access(addr, t as u64 + 2);
            prop_assert!(hit, "repeated access to the same address must keep hitting");
        }
    }

    #[test]
    fn hit_count_never_exceeds_total_accesses(
        num_sets in 1usize..=8,
        associativity in 1usize..=8,
        block_size in 1u64..=64,
        policy in policy_strategy(),
        addresses in prop::collection::vec(0u64..=1024, 0..150),
    ) {
        let total_size = total_size_for(num_sets, associativity, block_size);
        let mut cache = Cache::new(total_size, block_size, associativity, policy).unwrap();
        for (i, addr) in addresses.iter().enumerate() {
            cache.access(*addr, i as u64 + 1);
        }
        let stats = cache.stats();
        prop_assert!(stats.hit_count <= stats.total_accesses);
        prop_assert_eq!(stats.hit_count + stats.miss_count, stats.total_accesses);
    }
}
