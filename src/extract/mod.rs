// src/extract/mod.rs
// =============================================================================
// Turns a fetched page body into the links it points at.
//
// Two steps:
// 1. A Tokenizer pulls raw href strings out of the markup, in document order
// 2. resolve_links() resolves each one against the page's own URL, dropping
//    anything that doesn't parse as a URL reference
//
// Duplicates are kept on purpose: deduplication is the frontier's job.
//
// Rust concepts:
// - Traits: the tokenizer is swappable (HTML by default)
// - Iterators: filter_map to resolve and drop in one pass
// =============================================================================

mod html;

use url::Url;

pub use html::HtmlTokenizer;

/// Pulls raw `href` values out of a response body.
pub trait Tokenizer: Send + Sync {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String>;
}

/// Resolves every href against `base`, keeping document order.
///
/// Examples, with base = "http://h/a/b":
///   "/x"             -> "http://h/x"
///   "c"              -> "http://h/a/c"
///   "https://o.org/" -> "https://o.org/" (absolute, unchanged)
///   "http://[bad"    -> dropped
pub fn resolve_links<I>(base: &Url, hrefs: I) -> Vec<Url>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    hrefs
        .into_iter()
        .filter_map(|href| base.join(href.as_ref()).ok())
        .collect()
}

/// Tokenizes `body` and resolves the links it contains against `base`.
pub fn extract_links(tokenizer: &dyn Tokenizer, body: &[u8], base: &Url) -> Vec<Url> {
    resolve_links(base, tokenizer.extract_hrefs(body))
}
