// src/crawl/worker.rs
// =============================================================================
// A fetch worker: one of the N tasks that do the actual crawling.
//
// Loop:
// 1. Take a job from the queue (exit when the queue is closed)
// 2. Fetch it
// 3. On success: extract links, claim the new ones in the frontier, count
//    them as outstanding work, then queue them
// 4. Mark the job itself as finished and send its result to the sink
//
// Step 3 always happens before step 4, so the outstanding-work counter can
// never hit zero while links from this page are still on their way into the
// queue.
//
// If the queue is full, the remaining links of a page are handed to a small
// background task (tracked by a TaskTracker) that waits for room. The worker
// itself goes straight back to step 1; if it blocked instead, a crawl with a
// single worker and a tiny queue would wait on itself forever.
// =============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};
use url::Url;

use super::coordinator::Coordinator;
use super::frontier::Frontier;
use super::queue::{JobQueue, QueueClosed, TryEnqueueError};
use super::stats::CrawlStats;
use super::Job;
use crate::extract::{extract_links, Tokenizer};
use crate::fetch::Fetcher;
use crate::result::CrawlResult;

/// State shared by every worker of one crawl run.
pub(crate) struct Shared {
    pub frontier: Frontier,
    pub queue: JobQueue,
    pub coordinator: Coordinator,
    pub stats: CrawlStats,
    pub fetcher: Arc<dyn Fetcher>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub handoffs: TaskTracker,
    pub keep_bodies: bool,
}

impl Shared {
    /// Queues already-counted jobs, waiting for room as needed.
    async fn enqueue_all(&self, jobs: Vec<Job>) {
        for job in jobs {
            if let Err(QueueClosed(job)) = self.queue.enqueue(job).await {
                self.abandon(&job);
            }
        }
    }

    /// Gives up on a counted job that never made it into the queue.
    pub fn abandon(&self, job: &Job) {
        debug!(url = %job.target, "queue closed, dropping job");
        self.coordinator.job_finished();
    }
}

/// What a worker hands to the result-draining task.
pub(crate) struct Outcome {
    pub result: CrawlResult,
    pub body: Option<Vec<u8>>,
}

pub(crate) struct Worker {
    id: usize,
    shared: Arc<Shared>,
    results: mpsc::Sender<Outcome>,
}

impl Worker {
    pub fn new(id: usize, shared: Arc<Shared>, results: mpsc::Sender<Outcome>) -> Self {
        Self {
            id,
            shared,
            results,
        }
    }

    pub async fn run(self) {
        debug!(worker = self.id, "worker started");

        while let Some(job) = self.shared.queue.dequeue().await {
            self.shared.stats.request_made();
            let started = Instant::now();

            // A cancelled crawl abandons the fetch in flight; no result is
            // produced for it.
            let processed = tokio::select! {
                biased;
                _ = self.shared.coordinator.stopped() => {
                    debug!(worker = self.id, url = %job.target, "crawl stopping, abandoning fetch");
                    break;
                }
                processed = AssertUnwindSafe(self.process(&job)).catch_unwind() => processed,
            };

            let outcome = match processed {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(worker = self.id, url = %job.target, %message, "job panicked");
                    self.shared.stats.fetch_failed();
                    Outcome {
                        result: CrawlResult::crashed(&job, &message, started.elapsed()),
                        body: None,
                    }
                }
            };

            self.shared.coordinator.job_finished();

            if self.results.send(outcome).await.is_err() {
                warn!(worker = self.id, "result sink is gone, dropping result");
            }
        }

        debug!(worker = self.id, "worker exiting");
    }

    async fn process(&self, job: &Job) -> Outcome {
        let started = Instant::now();
        let fetched = self.shared.fetcher.fetch(&job.target).await;
        let elapsed = started.elapsed();

        match fetched {
            Ok(page) => {
                debug!(
                    worker = self.id,
                    url = %job.target,
                    status = page.status_code,
                    bytes = page.body.len(),
                    "fetched"
                );

                let links = extract_links(self.shared.tokenizer.as_ref(), &page.body, &job.target);
                self.schedule(job, links);

                let result = CrawlResult::fetched(job, &page, elapsed);
                let body = self.shared.keep_bodies.then_some(page.body);
                Outcome { result, body }
            }
            Err(err) => {
                warn!(worker = self.id, url = %job.target, error = %err, "fetch failed");
                self.shared.stats.fetch_failed();
                Outcome {
                    result: CrawlResult::failed(job, &err, elapsed),
                    body: None,
                }
            }
        }
    }

    // Claims, counts and queues the links found on `job`'s page.
    fn schedule(&self, job: &Job, links: Vec<Url>) {
        let fresh: Vec<Job> = links
            .into_iter()
            .filter(|link| self.shared.frontier.claim(link.as_str()))
            .map(|link| Job::discovered(link, job.target.clone()))
            .collect();

        if fresh.is_empty() {
            return;
        }

        self.shared.stats.links_found(fresh.len());
        self.shared.coordinator.jobs_created(fresh.len());
        debug!(worker = self.id, url = %job.target, new_links = fresh.len(), "scheduling links");

        let mut pending = fresh.into_iter();
        while let Some(next) = pending.next() {
            match self.shared.queue.try_enqueue(next) {
                Ok(()) => {}
                Err(TryEnqueueError::Full(next)) => {
                    let rest: Vec<Job> = std::iter::once(next).chain(pending).collect();
                    self.hand_off(rest);
                    return;
                }
                Err(TryEnqueueError::Closed(next)) => {
                    self.shared.abandon(&next);
                    for job in pending {
                        self.shared.abandon(&job);
                    }
                    return;
                }
            }
        }
    }

    // Not capped: a cap would bring back the self-wait described above. The
    // live count is logged so a backlog of parked links is visible.
    fn hand_off(&self, jobs: Vec<Job>) {
        debug!(
            worker = self.id,
            waiting = jobs.len(),
            live_handoffs = self.shared.handoffs.len() + 1,
            "queue full, handing off links"
        );
        let shared = Arc::clone(&self.shared);
        self.shared.handoffs.spawn(async move {
            shared.enqueue_all(jobs).await;
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
