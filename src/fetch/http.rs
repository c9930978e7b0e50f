// src/fetch/http.rs
// =============================================================================
// Fetches pages over HTTP with reqwest.
//
// Key functionality:
// - One shared Client (connection pooling across all workers)
// - GET request, full body read
// - Any status code counts as a fetched page; only transport failures and
//   unreadable bodies are errors
// - Transport failures are sorted into timeout / connect / redirect / other
// =============================================================================

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{FetchedPage, Fetcher};
use crate::config::CrawlConfig;
use crate::error::FetchError;

/// Follow at most this many redirects per request.
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawl configuration.
    ///
    /// No timeout is applied unless `request_timeout` is set.
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Self::build(&config.user_agent, config.request_timeout)
    }

    pub fn build(user_agent: &str, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        let status_code = response.status().as_u16();
        let content_length = response.content_length();

        // The server has answered by now, so even a timeout keeps the status.
        let body = response.bytes().await.map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            status_code,
            message: if e.is_timeout() {
                "timed out".to_string()
            } else {
                error_chain(&e)
            },
        })?;

        Ok(FetchedPage {
            status_code,
            content_length,
            body: body.to_vec(),
        })
    }
}

// Sorts reqwest errors into the failure kinds we report.
fn categorize_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_redirect() {
        FetchError::Redirect { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error_chain(&error),
        }
    } else {
        FetchError::Request {
            url,
            message: error_chain(&error),
        }
    }
}

// reqwest's top-level message is often just "error sending request"; the
// useful part (dns, refused, certificate) lives further down the chain.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
