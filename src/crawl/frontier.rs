// src/crawl/frontier.rs
// =============================================================================
// The frontier: every URL that has been claimed for fetching in this run.
//
// How it works:
// - claim(url) checks membership and inserts in ONE step, under one lock
// - the first caller to claim a URL gets `true` and may create a job for it
// - everyone else gets `false` and drops the link
// - entries are never removed, so no URL is fetched twice in a run
//
// Rust concepts:
// - Mutex<HashSet<_>>: shared mutable state guarded by a lock
// - HashSet::insert returns whether the value was new, which is exactly the
//   test-and-insert we need
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct Frontier {
    seen: Mutex<HashSet<String>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for fetching. Returns `true` only for the first claim.
    pub fn claim(&self, url: &str) -> bool {
        // A panic elsewhere while holding the lock cannot leave the set half
        // updated (insert is the only mutation), so a poisoned lock is safe
        // to keep using.
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    /// Number of URLs claimed so far.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not `if !contains { insert }`?
//    - Two workers could both see "not contained" before either inserts
//    - Both would then enqueue the same URL
//    - Doing the check and the insert under one lock closes that gap
//
// 2. Why std::sync::Mutex and not tokio::sync::Mutex?
//    - We never .await while holding the lock
//    - A std mutex is cheaper and fine for short critical sections
//
// 3. What is PoisonError::into_inner?
//    - If a thread panics while holding a std Mutex, the mutex is "poisoned"
//    - into_inner gives us the guard anyway instead of panicking again
// -----------------------------------------------------------------------------
