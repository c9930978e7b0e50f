// src/crawl/queue.rs
// =============================================================================
// The job queue connecting link discovery to the fetch workers.
//
// How it works:
// - A bounded tokio mpsc channel holds pending jobs
// - Many producers: every worker (and link hand-off task) holds the sender
// - Many consumers: the receiver sits behind an async Mutex, so exactly one
//   idle worker waits on it at a time and the others wait for the lock
// - Closing is done with a CancellationToken rather than by dropping
//   senders; once it fires, enqueue and dequeue both return immediately
//
// Backpressure:
// - When the channel is full, enqueue() waits for a worker to dequeue
// - try_enqueue() never waits and hands the job back instead
//
// Rust concepts:
// - tokio::select!: wait on several futures, act on whichever finishes first
// - `biased;`: poll branches in order, so a closed queue always wins
// =============================================================================

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::Job;

/// The queue was closed; the job that could not be enqueued is handed back.
#[derive(Debug)]
pub struct QueueClosed(pub Job);

#[derive(Debug)]
pub enum TryEnqueueError {
    /// No free slot right now.
    Full(Job),
    /// The queue no longer accepts work.
    Closed(Job),
}

pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    receiver: Mutex<mpsc::Receiver<Job>>,
    closed: CancellationToken,
}

impl JobQueue {
    /// Creates a queue holding at most `capacity` pending jobs. Cancelling
    /// `closed` closes the queue.
    pub fn new(capacity: usize, closed: CancellationToken) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            closed,
        }
    }

    /// Adds a job, waiting for a free slot while the queue is full.
    pub async fn enqueue(&self, job: Job) -> Result<(), QueueClosed> {
        if self.closed.is_cancelled() {
            return Err(QueueClosed(job));
        }

        // Reserve first so the job itself is never moved into a future that
        // might be dropped by select!.
        let permit = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(QueueClosed(job)),
            permit = self.sender.reserve() => permit,
        };

        match permit {
            Ok(permit) => {
                permit.send(job);
                Ok(())
            }
            Err(_) => Err(QueueClosed(job)),
        }
    }

    /// Adds a job only if a slot is free right now.
    pub fn try_enqueue(&self, job: Job) -> Result<(), TryEnqueueError> {
        if self.closed.is_cancelled() {
            return Err(TryEnqueueError::Closed(job));
        }

        match self.sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => Err(TryEnqueueError::Full(job)),
            Err(TrySendError::Closed(job)) => Err(TryEnqueueError::Closed(job)),
        }
    }

    /// Waits for the next job. `None` means the queue was closed.
    pub async fn dequeue(&self) -> Option<Job> {
        let mut receiver = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return None,
            receiver = self.receiver.lock() => receiver,
        };

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            job = receiver.recv() => job,
        }
    }

    /// Closes the queue. Jobs still buffered are never handed out.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of jobs currently waiting.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a bounded channel?
//    - A page with thousands of links would otherwise fill memory with jobs
//    - Bounding the channel makes fast producers wait for slow consumers
//
// 2. Why is the Receiver inside a Mutex?
//    - tokio's mpsc has a single receiver
//    - Wrapping it in a Mutex lets N workers share it; whoever holds the lock
//      is the one waiting for the next job
//
// 3. What is reserve()?
//    - It waits for a free slot and returns a "permit"
//    - permit.send(job) then can't fail and doesn't wait
// -----------------------------------------------------------------------------
