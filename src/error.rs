// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// Only a few things are allowed to stop a crawl:
// - the seed URL cannot be parsed
// - the worker pool cannot be set up (bad configuration)
// - the result-draining task itself dies
//
// Everything that goes wrong for a single page (network failure, unreadable
// body, a sink that cannot persist a record) is turned into data instead:
// an error string inside that page's CrawlResult, or a log line plus a
// counter in the final summary.
//
// Rust concepts:
// - thiserror: derive std::error::Error + Display from attributes
// - #[source] / #[from]: chain underlying errors for better reports
// =============================================================================

use thiserror::Error;

/// Fatal errors that end a crawl before it could finish.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed could not be turned into a fetchable URL.
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The worker pool could not be initialized.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The task draining results into the sink panicked or was aborted.
    #[error("result sink task failed: {0}")]
    SinkTask(#[source] tokio::task::JoinError),
}

/// Configuration values that make it impossible to start a worker pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency must be greater than 0")]
    ZeroConcurrency,

    #[error("job queue capacity must be greater than 0")]
    ZeroQueueCapacity,

    #[error("result buffer must be greater than 0")]
    ZeroResultBuffer,
}

/// Why a single page could not be fetched.
///
/// These never abort the crawl; they end up as the `error` field of the
/// page's `CrawlResult`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete in time.
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    /// DNS failure, refused connection, TLS handshake failure...
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    /// The redirect chain was too long or looped.
    #[error("too many redirects fetching {url}")]
    Redirect { url: String },

    /// Any other transport-level failure.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered but the body could not be read in full.
    #[error("failed reading body of {url} (HTTP {status_code}): {message}")]
    BodyRead {
        url: String,
        status_code: u16,
        message: String,
    },
}

impl FetchError {
    /// Status code the server sent before failing, or 0 if it never answered.
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::BodyRead { status_code, .. } => *status_code,
            _ => 0,
        }
    }
}

/// A result sink could not persist a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("graph database request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("graph database rejected {operation} with HTTP {status}")]
    Rejected { operation: &'static str, status: u16 },
}
