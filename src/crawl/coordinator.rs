// src/crawl/coordinator.rs
// =============================================================================
// Termination detection for the crawl.
//
// The problem:
// - workers consume jobs, but every job can also produce new jobs
// - an empty queue does NOT mean we're done: a worker may be about to
//   enqueue fifty links from the page it is still reading
//
// The solution: an outstanding-work counter.
// - +n when n new jobs are created (before any of them is enqueued)
// - -1 when a job's fetch has completed and its own links are counted
// - a job's links are always counted before the job itself is finished, so
//   while any job exists the counter is above zero
// - the update that takes it from 1 to 0 is the single moment the crawl is
//   known to be over; that update (and only that one) closes the queue
//
// State machine:
//
//   Running --(counter 1 -> 0)--> Draining --(workers joined)--> Stopped
//      \                                                          ^
//       `------------------(caller cancellation)------------------'
// =============================================================================

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Jobs exist somewhere in the system.
    Running,
    /// No job exists; workers are being shut down.
    Draining,
    /// Queue closed and every worker has exited.
    Stopped,
}

impl CrawlState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CrawlState::Running,
            1 => CrawlState::Draining,
            _ => CrawlState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            CrawlState::Running => 0,
            CrawlState::Draining => 1,
            CrawlState::Stopped => 2,
        }
    }
}

#[derive(Debug)]
pub struct Coordinator {
    outstanding: AtomicUsize,
    state: AtomicU8,
    stop: CancellationToken,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(0),
            state: AtomicU8::new(CrawlState::Running.as_u8()),
            stop: CancellationToken::new(),
        }
    }

    /// Token that fires once the crawl must stop, whether because the work
    /// ran out or because it was cancelled. The job queue closes on it.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Resolves once the crawl must stop.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.stop.cancelled()
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn state(&self) -> CrawlState {
        CrawlState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Accounts for `count` newly created jobs. Must be called before any of
    /// them can be dequeued.
    pub fn jobs_created(&self, count: usize) {
        if count > 0 {
            self.outstanding.fetch_add(count, Ordering::AcqRel);
        }
    }

    /// Accounts for one job that is done (fetched, failed or abandoned).
    ///
    /// Returns `true` if this call drained the crawl.
    pub fn job_finished(&self) -> bool {
        let previous = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.begin_draining(),
            Ok(_) => false,
            Err(_) => {
                error!("outstanding-work counter would go below zero; ignoring");
                false
            }
        }
    }

    fn begin_draining(&self) -> bool {
        let won = self.transition(CrawlState::Running, CrawlState::Draining);
        if won {
            debug!("no outstanding work left, draining");
            self.stop.cancel();
        }
        won
    }

    /// Caller-initiated stop. Returns `false` if the crawl was already
    /// draining or stopped.
    pub fn cancel(&self) -> bool {
        let won = self.transition(CrawlState::Running, CrawlState::Stopped);
        if won {
            debug!(outstanding = self.outstanding(), "crawl cancelled");
            self.stop.cancel();
        }
        won
    }

    /// Marks the end of draining, once every worker has exited.
    pub fn finish(&self) {
        self.state
            .store(CrawlState::Stopped.as_u8(), Ordering::Release);
    }

    fn transition(&self, from: CrawlState, to: CrawlState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
