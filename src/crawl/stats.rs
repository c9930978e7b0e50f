// src/crawl/stats.rs
// Running counters shared by the workers and the result sink.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CrawlStats {
    requests_made: AtomicU64,
    links_found: AtomicU64,
    failures: AtomicU64,
}

/// A point-in-time copy of the counters, handed to sinks with each result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Jobs a worker has started fetching.
    pub requests_made: u64,
    /// Links that won a frontier claim (the seed is not counted).
    pub links_found: u64,
    pub failures: u64,
}

impl CrawlStats {
    pub fn request_made(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
    }

    pub fn links_found(&self, count: usize) {
        self.links_found.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn progress(&self) -> Progress {
        Progress {
            requests_made: self.requests_made.load(Ordering::Relaxed),
            links_found: self.links_found.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
