// src/lib.rs
// =============================================================================
// sucker: a concurrent breadth-first web crawler.
//
// Give it a seed URL, a Fetcher and a ResultSink; it fetches every page
// reachable from the seed exactly once, with a fixed pool of workers, and
// hands one CrawlResult per fetch to the sink.
//
// Modules:
// - crawl:   the engine (frontier, queue, workers, termination)
// - fetch:   the Fetcher trait and the reqwest-based HttpFetcher
// - extract: href extraction and URL resolution
// - sink:    console, JSON lines, content store and graph database sinks
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod result;
pub mod sink;

pub use config::CrawlConfig;
pub use crawl::{Completion, CrawlSummary, Crawler};
pub use error::{ConfigError, CrawlError, FetchError, SinkError};
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use result::CrawlResult;
pub use sink::{Delivery, ResultSink};
