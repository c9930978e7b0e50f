// src/config.rs
// =============================================================================
// Knobs for a crawl run.
//
// The engine does not know about flags or environment variables; the CLI
// builds a CrawlConfig and hands it over. The only checks done here are the
// ones without which a worker pool cannot exist at all.
// =============================================================================

use std::time::Duration;

use crate::error::ConfigError;

/// Number of workers used when nothing else is specified.
pub const DEFAULT_CONCURRENCY: usize = 64;
/// Pending jobs the queue holds before `enqueue` starts blocking.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
/// Results buffered between the workers and the sink.
pub const DEFAULT_RESULT_BUFFER: usize = 256;
pub const DEFAULT_USER_AGENT: &str = concat!("sucker/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// How many fetch workers run in parallel.
    pub concurrency: usize,
    /// Bound of the job queue; producers block when it is full.
    pub queue_capacity: usize,
    /// Bound of the results channel feeding the sink.
    pub result_buffer: usize,
    /// Per-request timeout for the HTTP fetcher. `None` = wait forever.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            result_buffer: DEFAULT_RESULT_BUFFER,
            request_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_result_buffer(mut self, buffer: usize) -> Self {
        self.result_buffer = buffer;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Rejects settings that would leave the crawl without workers or
    /// without room to pass a single job or result along.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.result_buffer == 0 {
            return Err(ConfigError::ZeroResultBuffer);
        }
        Ok(())
    }
}
