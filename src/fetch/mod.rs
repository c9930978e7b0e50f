// src/fetch/mod.rs
// =============================================================================
// The fetch capability the crawl engine consumes.
//
// The engine never talks to the network itself. It is handed something that
// implements `Fetcher`, which turns a URL into a status code and a body (or
// an error). The production implementation is HttpFetcher; tests use
// in-memory fakes.
//
// Rust concepts:
// - Traits: an interface the engine is generic over
// - async-trait: lets us store `Arc<dyn Fetcher>` even though fetch is async
// =============================================================================

mod http;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

pub use http::HttpFetcher;

/// A page whose body was read in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status_code: u16,
    /// Length reported by the transport (e.g. Content-Length), if any.
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and reads its whole body.
    ///
    /// Non-2xx responses are still pages: their status code is data, not an
    /// error.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}
