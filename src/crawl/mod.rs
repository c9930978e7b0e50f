// src/crawl/mod.rs
// =============================================================================
// The concurrent crawl engine.
//
// Pieces:
// - frontier:    every URL claimed so far (deduplication)
// - queue:       bounded channel of pending jobs
// - coordinator: outstanding-work counter and shutdown state machine
// - worker:      fetch, extract, schedule, report
// - engine:      Crawler, which wires the above together for one run
// - stats:       counters reported alongside each result
//
// Flow:
//   seed -> frontier.claim -> queue -> worker -> links -> frontier.claim -> queue
//                                         \-> result -> sink
// =============================================================================

mod coordinator;
mod engine;
mod frontier;
mod job;
mod queue;
mod stats;
mod worker;

pub use coordinator::{Coordinator, CrawlState};
pub use engine::{Completion, CrawlSummary, Crawler};
pub use frontier::Frontier;
pub use job::Job;
pub use queue::{JobQueue, QueueClosed, TryEnqueueError};
pub use stats::{CrawlStats, Progress};
