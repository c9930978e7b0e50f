// src/result.rs
// =============================================================================
// The record produced for every completed fetch.
//
// One CrawlResult is created per job, by the worker that ran it, and is
// consumed exactly once by the result sink. It is never modified after
// construction.
//
// Field meanings:
// - error:          None on success, a human readable message on failure
// - status_code:    HTTP status, or 0 if no response was received
// - duration:       wall-clock time spent fetching and reading the body
// - content_length: bytes in the body, or -1 if unknown (failed fetch)
// =============================================================================

use std::time::Duration;

use serde::{Serialize, Serializer};
use url::Url;

use crate::crawl::Job;
use crate::error::FetchError;
use crate::fetch::FetchedPage;

/// Sentinel stored in `content_length` when no body size is known.
pub const UNKNOWN_LENGTH: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status_code: u16,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub content_length: i64,
}

impl CrawlResult {
    /// Result for a page whose body was read in full.
    ///
    /// A positive length reported by the transport wins; otherwise the
    /// number of bytes actually read is used.
    pub fn fetched(job: &Job, page: &FetchedPage, duration: Duration) -> Self {
        let content_length = match page.content_length {
            Some(len) if len > 0 => i64::try_from(len).unwrap_or(i64::MAX),
            _ => i64::try_from(page.body.len()).unwrap_or(i64::MAX),
        };

        Self {
            url: job.target.clone(),
            referer: job.referer.clone(),
            error: None,
            status_code: page.status_code,
            duration,
            content_length,
        }
    }

    /// Result for a job that failed before its body was available.
    pub fn failed(job: &Job, error: &FetchError, duration: Duration) -> Self {
        Self {
            url: job.target.clone(),
            referer: job.referer.clone(),
            error: Some(error.to_string()),
            status_code: error.status_code(),
            duration,
            content_length: UNKNOWN_LENGTH,
        }
    }

    /// Result for a job whose processing panicked.
    pub(crate) fn crashed(job: &Job, message: &str, duration: Duration) -> Self {
        Self {
            url: job.target.clone(),
            referer: job.referer.clone(),
            error: Some(format!("worker panicked: {message}")),
            status_code: 0,
            duration,
            content_length: UNKNOWN_LENGTH,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
