// src/sink/store.rs
// =============================================================================
// Stores every crawled page on disk under a name derived from its URL.
//
// Layout, with <key> = hex(sha256(url)):
//   <dir>/<key>.json   the CrawlResult for the page
//   <dir>/<key>.body   the raw response body (successful fetches only)
//
// The same URL always maps to the same files, so re-running a crawl into the
// same directory overwrites rather than duplicates.
// =============================================================================

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use url::Url;

use super::{Delivery, ResultSink};
use crate::error::SinkError;

#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| io_error(&dir, source))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name stem used for `url`.
    pub fn key_for(url: &Url) -> String {
        hex::encode(Sha256::digest(url.as_str().as_bytes()))
    }

    pub fn result_path(&self, url: &Url) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key_for(url)))
    }

    pub fn body_path(&self, url: &Url) -> PathBuf {
        self.dir.join(format!("{}.body", Self::key_for(url)))
    }
}

#[async_trait]
impl ResultSink for ContentStore {
    fn wants_body(&self) -> bool {
        true
    }

    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
        let url = &delivery.result.url;

        if let Some(body) = &delivery.body {
            let path = self.body_path(url);
            tokio::fs::write(&path, body)
                .await
                .map_err(|source| io_error(&path, source))?;
        }

        let record = serde_json::to_vec_pretty(&delivery.result)?;
        let path = self.result_path(url);
        tokio::fs::write(&path, record)
            .await
            .map_err(|source| io_error(&path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}
