// src/crawl/job.rs
// A unit of work: one URL to fetch, plus the page it was found on.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub target: Url,
    /// The page whose links produced this job. `None` for the seed.
    pub referer: Option<Url>,
}

impl Job {
    pub fn seed(target: Url) -> Self {
        Self {
            target,
            referer: None,
        }
    }

    pub fn discovered(target: Url, referer: Url) -> Self {
        Self {
            target,
            referer: Some(referer),
        }
    }
}
