//! Line-oriented command interpreter driving the allocator and cache
//! engines from a REPL or script session.

use allocsim_core::allocator::{BuddyAllocator, PlacementPolicy};
use allocsim_core::error::SimError;

use crate::format;
use crate::session::Session;

fn buddy_not_initialized() -> String {
    SimError::engine_not_initialized("Buddy").to_string()
}

const HELP_TEXT: &str = "\
Commands:
  help
  init memory <size>
  set allocator <first_fit | best_fit | worst_fit>
  malloc <size>
  free <block_id>
  dump memory
  visualize
  stats
  access <address>
  cache dump
  cache stats
  buddy_init <size>
  buddy_malloc <size>
  buddy_free <block_id>
  buddy_dump
  buddy_stats
  exit | quit";

/// What the REPL loop should do after executing one line.
pub enum Outcome {
    /// Print this text and keep reading.
    Continue(String),
    /// Terminate the session.
    Exit,
}

fn continue_with(text: impl Into<String>) -> Outcome {
    Outcome::Continue(text.into())
}

fn parse_u64(token: &str) -> Result<u64, String> {
    token.parse().map_err(|_| format!("not a valid size: {token}"))
}

fn parse_i64(token: &str) -> Result<i64, String> {
    token.parse().map_err(|_| format!("not a valid id: {token}"))
}

fn parse_policy(token: &str) -> Result<PlacementPolicy, String> {
    match token {
        "first_fit" => Ok(PlacementPolicy::FirstFit),
        "best_fit" => Ok(PlacementPolicy::BestFit),
        "worst_fit" => Ok(PlacementPolicy::WorstFit),
        other => Err(format!("unknown allocator policy: {other}")),
    }
}

/// Parse and run one line of input against `session`.
pub fn execute(session: &mut Session, line: &str) -> Outcome {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [] => continue_with(String::new()),

        ["help"] => continue_with(HELP_TEXT),

        ["init", "memory", size] => match parse_u64(size) {
            Ok(size) => {
                session.partition.init(size);
                continue_with(format!("Initialized partition memory with {size} bytes"))
            }
            Err(e) => continue_with(e),
        },

        ["set", "allocator", policy] => match parse_policy(policy) {
            Ok(policy) => {
                session.partition.set_policy(policy);
                continue_with(format!("Allocator policy set to {policy:?}"))
            }
            Err(e) => continue_with(e),
        },

        ["malloc", size] => match parse_u64(size) {
            Ok(size) => match session.partition.allocate(size) {
                Ok(id) => continue_with(format!("Allocated block id={id}")),
                Err(e) => continue_with(format!("Allocation failed: {e}")),
            },
            Err(e) => continue_with(e),
        },

        ["free", id] => match parse_i64(id) {
            Ok(id) => match session.partition.free(id) {
                Ok(()) => continue_with(format!("Block {id} freed and coalesced if possible")),
                Err(e) => continue_with(format!("{e}")),
            },
            Err(e) => continue_with(e),
        },

        ["dump", "memory"] => continue_with(format::partition_dump(&session.partition)),

        ["visualize"] => continue_with(format::visualize(&session.partition)),

        // `stats` reports the buddy allocator if one has been created, else
        // the partition allocator. `buddy_stats` always targets the buddy
        // allocator.
        ["stats"] => {
            if let Some(buddy) = &session.buddy {
                continue_with(format::buddy_stats(buddy))
            } else {
                continue_with(format::partition_stats(&session.partition))
            }
        }

        ["access", addr] => match parse_u64(addr) {
            Ok(addr) => {
                let outcome = session.cache.access(addr);
                continue_with(format!("{outcome:?}"))
            }
            Err(e) => continue_with(e),
        },

        ["cache", "dump"] => continue_with(format::cache_dump(&session.cache)),
        ["cache", "stats"] => continue_with(format::cache_stats(&session.cache)),

        ["buddy_init", size] => match parse_u64(size) {
            Ok(size) => {
                let buddy = BuddyAllocator::new(size);
                let rounded = buddy.total_memory();
                session.buddy = Some(buddy);
                if rounded == size {
                    continue_with(format!("Buddy allocator initialized with {rounded} bytes"))
                } else {
                    continue_with(format!(
                        "Buddy allocator initialized with {size} bytes, rounded up to {rounded}"
                    ))
                }
            }
            Err(e) => continue_with(e),
        },

        ["buddy_malloc", size] => match (parse_u64(size), &mut session.buddy) {
            (Ok(_), None) => continue_with(buddy_not_initialized()),
            (Ok(size), Some(buddy)) => match buddy.allocate(size) {
                Ok(id) => continue_with(format!("Allocated buddy block id={id}")),
                Err(e) => continue_with(format!("Allocation failed: {e}")),
            },
            (Err(e), _) => continue_with(e),
        },

        ["buddy_free", id] => match (parse_i64(id), &mut session.buddy) {
            (Ok(_), None) => continue_with(buddy_not_initialized()),
            (Ok(id), Some(buddy)) => match buddy.free(id) {
                Ok(()) => continue_with(format!("Buddy block {id} freed")),
                Err(e) => continue_with(format!("{e}")),
            },
            (Err(e), _) => continue_with(e),
        },

        ["buddy_dump"] => match &session.buddy {
            Some(buddy) => continue_with(format::buddy_dump(buddy)),
            None => continue_with(buddy_not_initialized()),
        },

        ["buddy_stats"] => match &session.buddy {
            Some(buddy) => continue_with(format::buddy_stats(buddy)),
            None => continue_with(buddy_not_initialized()),
        },

        ["exit" | "quit"] => Outcome::Exit,

        _ => continue_with(format!("Unknown command: {line}")),
    }
}
