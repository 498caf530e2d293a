//! Textual rendering of engine state: dumps, visualizations, and stats
//! reports, all directed to a caller-supplied sink rather than printed
//! directly (the engines themselves have no knowledge of a terminal).

use std::fmt::Write as _;

use allocsim_core::allocator::{BuddyAllocator, PartitionAllocator};
use allocsim_core::cache::{Cache, MultiLevelCache};

/// `[0xSSSS - 0xEEEE] FREE|USED [(id=N)]`, 4-hex-digit zero-padded bounds.
fn block_line(lo: u64, hi: u64, free: bool, id: i64) -> String {
    if free {
        format!("[0x{lo:04X} - 0x{hi:04X}] FREE")
    } else {
        format!("[0x{lo:04X} - 0x{hi:04X}] USED (id={id})")
    }
}

pub fn partition_dump(alloc: &PartitionAllocator) -> String {
    let mut out = String::from("=== MEMORY DUMP ===\n");
    for b in alloc.blocks() {
        let _ = writeln!(out, "{}", block_line(b.start, b.end_inclusive(), b.free, b.id));
    }
    out
}

/// A 1-D bar of `clamp(total_memory / 32, 32, 80)` cells; cell `i` is `#`
/// iff any used block intersects `[i*total/scale, (i+1)*total/scale)`.
pub fn visualize(alloc: &PartitionAllocator) -> String {
    let total = alloc.total_memory();
    if total == 0 {
        return "[]".to_string();
    }

    let scale = (total / 32).clamp(32, 80);
    let mut bar = String::with_capacity(scale as usize + 2);
    bar.push('[');
    for i in 0..scale {
        let cell_start = i * total / scale;
        let cell_end = (i + 1) * total / scale;
        let used = alloc.blocks().iter().any(|b| {
            !b.free && b.start < cell_end && cell_start < b.start + b.size
        });
        bar.push(if used { '#' } else { '_' });
    }
    bar.push(']');
    bar
}

pub fn partition_stats(alloc: &PartitionAllocator) -> String {
    let s = alloc.stats();
    let mut out = String::from("=== MEMORY STATS ===\n");
    let _ = writeln!(out, "Total: {} bytes", s.total);
    let _ = writeln!(out, "Used: {} bytes", s.used);
    let _ = writeln!(out, "Free: {} bytes", s.free);
    let _ = writeln!(out, "Utilization: {:.2}%", s.utilization_percent);
    let _ = writeln!(out, "Internal fragmentation: {} bytes", s.internal_fragmentation);
    let _ = writeln!(out, "External fragmentation: {:.2}%", s.external_fragmentation_percent);
    let _ = writeln!(out, "Allocation successes: {}", s.alloc_success);
    let _ = writeln!(out, "Allocation failures: {}", s.alloc_fail);
    let _ = writeln!(out, "Total requests: {}", s.total_requests);
    let _ = writeln!(out, "Success rate: {:.2}%", s.success_rate_percent);
    let _ = write!(out, "Failure rate: {:.2}%", s.failure_rate_percent);
    out
}

/// Lists free blocks in ascending size order, then allocated blocks sorted
/// by start address, so the dump shows the whole address space rather than
/// only its free portion.
pub fn buddy_dump(alloc: &BuddyAllocator) -> String {
    let mut out = String::from("=== BUDDY DUMP ===\n");

    let mut free: Vec<_> = alloc.blocks().into_iter().filter(|b| b.free).collect();
    free.sort_by_key(|b| (b.size, b.start));
    let _ = writeln!(out, "-- free --");
    for b in &free {
        let _ = writeln!(out, "{}", block_line(b.start, b.end_inclusive(), true, -1));
    }

    let mut used: Vec<_> = alloc.blocks().into_iter().filter(|b| !b.free).collect();
    used.sort_by_key(|b| b.start);
    let _ = writeln!(out, "-- used --");
    for (i, b) in used.iter().enumerate() {
        if i + 1 == used.len() {
            let _ = write!(out, "{}", block_line(b.start, b.end_inclusive(), false, b.id));
        } else {
            let _ = writeln!(out, "{}", block_line(b.start, b.end_inclusive(), false, b.id));
        }
    }

    out
}

pub fn buddy_stats(alloc: &BuddyAllocator) -> String {
    let s = alloc.stats();
    let mut out = String::from("=== BUDDY STATS ===\n");
    let _ = writeln!(out, "Total: {} bytes", s.total);
    let _ = writeln!(out, "Used: {} bytes", s.used);
    let _ = writeln!(out, "Free: {} bytes", s.free);
    let _ = writeln!(out, "Utilization: {:.2}%", s.utilization_percent);
    let _ = writeln!(out, "Allocation successes: {}", s.alloc_success);
    let _ = writeln!(out, "Allocation failures: {}", s.alloc_fail);
    let _ = write!(out, "Total requests: {}", s.total_requests);
    out
}

fn cache_dump_one(label: &str, cache: &Cache) -> String {
    let mut out = format!("-- {label} --\n");
    for (set_idx, set) in cache.sets().iter().enumerate() {
        let _ = write!(out, "Set {set_idx}: ");
        for line in set {
            if line.valid {
                let _ = write!(out, "V(tag={}, f={}) ", line.tag, line.freq);
            } else {
                let _ = write!(out, "I ");
            }
        }
        out.push('\n');
    }
    out
}

pub fn cache_dump(cache: &MultiLevelCache) -> String {
    let mut out = String::from("=== MULTILEVEL CACHE DUMP ===\n");
    out.push_str(&cache_dump_one("L1", cache.l1()));
    let _ = write!(out, "{}", cache_dump_one("L2", cache.l2()));
    out.trim_end().to_string()
}

pub fn cache_stats(cache: &MultiLevelCache) -> String {
    let s = cache.stats();
    let mut out = String::from("=== MULTILEVEL CACHE STATS ===\n");
    let _ = writeln!(out, "L1 hits: {}  L1 misses: {}", s.l1_hits, s.l1_misses);
    let _ = writeln!(out, "L2 hits: {}  L2 misses: {}", s.l2_hits, s.l2_misses);
    let _ = writeln!(out, "L1 hit ratio: {:.2}%", s.l1_hit_ratio_percent);
    let _ = write!(out, "L2 hit ratio: {:.2}%", s.l2_hit_ratio_percent);
    out
}
