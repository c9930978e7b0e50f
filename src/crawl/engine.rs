// src/crawl/engine.rs
// =============================================================================
// The crawl entry point: sets up one run, waits for it to end, tears it down.
//
// A run:
// 1. Validate config and parse the seed (the only fatal failures)
// 2. Start the result-draining task and N workers
// 3. Claim, count and queue the seed
// 4. Wait until the outstanding-work counter drains or the caller cancels
// 5. Join every worker and hand-off task, then let the sink drain
//
// Cancellation policy: fetches in flight when the caller cancels are
// abandoned (no result is produced for them); results already produced are
// still delivered to the sink.
// =============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use url::Url;

use super::coordinator::Coordinator;
use super::frontier::Frontier;
use super::queue::{JobQueue, QueueClosed};
use super::stats::CrawlStats;
use super::worker::{Outcome, Shared, Worker};
use super::Job;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::extract::{HtmlTokenizer, Tokenizer};
use crate::fetch::Fetcher;
use crate::sink::{Delivery, ResultSink};

/// How a run came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every reachable URL was fetched.
    Drained,
    /// The caller stopped the run early.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub completion: Completion,
    /// Results handed to the sink.
    pub results: u64,
    /// Jobs whose result carries an error.
    pub failures: u64,
    pub requests_made: u64,
    /// Distinct URLs claimed, the seed included.
    pub urls_claimed: usize,
    /// Results the sink failed to persist.
    pub sink_errors: u64,
    pub elapsed: Duration,
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Crawler {
    /// A crawler using the HTML tokenizer.
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            tokenizer: Arc::new(HtmlTokenizer::new()),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls everything reachable from `seed`, returning once no work is left.
    pub async fn run<S>(&self, seed: &str, sink: S) -> Result<CrawlSummary, CrawlError>
    where
        S: ResultSink + 'static,
    {
        self.run_until(seed, sink, CancellationToken::new()).await
    }

    /// Like [`Crawler::run`], but also stops when `cancel` fires.
    pub async fn run_until<S>(
        &self,
        seed: &str,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<CrawlSummary, CrawlError>
    where
        S: ResultSink + 'static,
    {
        self.config.validate()?;
        let seed = Url::parse(seed).map_err(|source| CrawlError::InvalidSeed {
            url: seed.to_string(),
            source,
        })?;

        let started = Instant::now();
        let coordinator = Coordinator::new();
        let queue = JobQueue::new(self.config.queue_capacity, coordinator.stop_token());
        let shared = Arc::new(Shared {
            frontier: Frontier::new(),
            queue,
            coordinator,
            stats: CrawlStats::default(),
            fetcher: Arc::clone(&self.fetcher),
            tokenizer: Arc::clone(&self.tokenizer),
            handoffs: TaskTracker::new(),
            keep_bodies: sink.wants_body(),
        });

        let (results_tx, results_rx) = mpsc::channel(self.config.result_buffer);
        let drain = tokio::spawn(drain_results(results_rx, sink, Arc::clone(&shared)));

        let workers: Vec<_> = (0..self.config.concurrency)
            .map(|id| {
                let worker = Worker::new(id, Arc::clone(&shared), results_tx.clone());
                tokio::spawn(worker.run())
            })
            .collect();
        // Workers hold the only senders now; the drain task ends after the
        // last worker exits.
        drop(results_tx);

        info!(
            seed = %seed,
            concurrency = self.config.concurrency,
            queue_capacity = self.config.queue_capacity,
            "crawl started"
        );

        shared.frontier.claim(seed.as_str());
        shared.coordinator.jobs_created(1);
        if let Err(QueueClosed(job)) = shared.queue.enqueue(Job::seed(seed)).await {
            shared.abandon(&job);
        }

        let completion = tokio::select! {
            biased;
            _ = shared.coordinator.stopped() => Completion::Drained,
            _ = cancel.cancelled() => {
                if shared.coordinator.cancel() {
                    info!("cancellation requested, stopping crawl");
                    Completion::Cancelled
                } else {
                    Completion::Drained
                }
            }
        };

        for joined in join_all(workers).await {
            if let Err(err) = joined {
                error!(error = %err, "worker task failed");
            }
        }
        shared.handoffs.close();
        shared.handoffs.wait().await;
        shared.coordinator.finish();

        let report = drain.await.map_err(CrawlError::SinkTask)?;
        let progress = shared.stats.progress();

        let summary = CrawlSummary {
            completion,
            results: report.delivered,
            failures: progress.failures,
            requests_made: progress.requests_made,
            urls_claimed: shared.frontier.len(),
            sink_errors: report.errors,
            elapsed: started.elapsed(),
        };

        info!(
            ?completion,
            results = summary.results,
            failures = summary.failures,
            urls = summary.urls_claimed,
            sink_errors = summary.sink_errors,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "crawl finished"
        );

        Ok(summary)
    }
}

#[derive(Debug, Default)]
struct SinkReport {
    delivered: u64,
    errors: u64,
}

async fn drain_results<S: ResultSink>(
    mut results: mpsc::Receiver<Outcome>,
    mut sink: S,
    shared: Arc<Shared>,
) -> SinkReport {
    let mut report = SinkReport::default();

    while let Some(outcome) = results.recv().await {
        let delivery = Delivery {
            result: outcome.result,
            body: outcome.body,
            progress: shared.stats.progress(),
        };
        report.delivered += 1;

        if let Err(err) = sink.accept(&delivery).await {
            report.errors += 1;
            warn!(url = %delivery.result.url, error = %err, "failed to persist result");
        }
    }

    if let Err(err) = sink.flush().await {
        report.errors += 1;
        warn!(error = %err, "failed to flush result sink");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, FetchError, SinkError};
    use crate::fetch::FetchedPage;
    use crate::result::CrawlResult;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    enum FakePage {
        Html(Vec<String>),
        Fail,
        /// Answers with `status`, then dies mid-body. The links never arrive.
        BodyRead { status: u16, links: Vec<String> },
        Hang,
        Panic,
    }

    /// An in-memory web: URL -> page. Unknown URLs answer 404 with no links.
    #[derive(Default)]
    struct FakeWeb {
        pages: HashMap<String, FakePage>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeWeb {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            let links = links.iter().map(|l| l.to_string()).collect();
            self.pages.insert(url.to_string(), FakePage::Html(links));
            self
        }

        fn with(mut self, url: &str, page: FakePage) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }
    }

    #[async_trait]
    impl Fetcher for FakeWeb {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            // Give other workers a chance to interleave.
            tokio::task::yield_now().await;

            match self.pages.get(url.as_str()) {
                Some(FakePage::Html(links)) => {
                    let body: String = links
                        .iter()
                        .map(|l| format!("<a href=\"{l}\">link</a>"))
                        .collect();
                    Ok(FetchedPage {
                        status_code: 200,
                        content_length: None,
                        body: body.into_bytes(),
                    })
                }
                Some(FakePage::Fail) => Err(FetchError::Connect {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
                Some(FakePage::BodyRead { status, links }) => Err(FetchError::BodyRead {
                    url: url.to_string(),
                    status_code: *status,
                    message: format!("connection reset before {} links were read", links.len()),
                }),
                Some(FakePage::Hang) => std::future::pending().await,
                Some(FakePage::Panic) => panic!("fetcher blew up"),
                None => Ok(FetchedPage {
                    status_code: 404,
                    content_length: Some(0),
                    body: Vec::new(),
                }),
            }
        }
    }

    #[derive(Clone, Default)]
    struct CollectSink {
        deliveries: Arc<Mutex<Vec<Delivery>>>,
        want_body: bool,
    }

    impl CollectSink {
        fn results(&self) -> Vec<CrawlResult> {
            self.deliveries
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.result.clone())
                .collect()
        }

        fn urls(&self) -> Vec<String> {
            self.results().iter().map(|r| r.url.to_string()).collect()
        }
    }

    #[async_trait]
    impl ResultSink for CollectSink {
        fn wants_body(&self) -> bool {
            self.want_body
        }

        async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
            self.deliveries.lock().unwrap().push(delivery.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ResultSink for FailingSink {
        async fn accept(&mut self, _delivery: &Delivery) -> Result<(), SinkError> {
            Err(SinkError::Rejected {
                operation: "create node",
                status: 503,
            })
        }
    }

    // A -> {B, C}, B -> {C, D}, C -> {}, D -> {A}; E exists but nothing links to it.
    fn cyclic_web() -> FakeWeb {
        FakeWeb::default()
            .page("http://h/a", &["/b", "/c"])
            .page("http://h/b", &["/c", "/d"])
            .page("http://h/c", &[])
            .page("http://h/d", &["/a"])
            .page("http://h/e", &["/a"])
    }

    fn crawler(web: FakeWeb, concurrency: usize, queue_capacity: usize) -> (Crawler, Arc<FakeWeb>) {
        let web = Arc::new(web);
        let config = CrawlConfig::default()
            .with_concurrency(concurrency)
            .with_queue_capacity(queue_capacity);
        let fetcher: Arc<dyn Fetcher> = web.clone();
        (Crawler::new(config, fetcher), web)
    }

    fn sorted(mut urls: Vec<String>) -> Vec<String> {
        urls.sort();
        urls
    }

    #[tokio::test]
    async fn test_cyclic_graph_terminates_for_any_pool_size() {
        for concurrency in [1, 2, 4, 64] {
            let (crawler, web) = crawler(cyclic_web(), concurrency, 16);
            let sink = CollectSink::default();

            let summary = crawler.run("http://h/a", sink.clone()).await.unwrap();

            assert_eq!(summary.completion, Completion::Drained);
            assert_eq!(
                sorted(sink.urls()),
                vec!["http://h/a", "http://h/b", "http://h/c", "http://h/d"],
                "concurrency {concurrency}"
            );
            assert_eq!(summary.results, 4);
            assert_eq!(summary.requests_made, 4);
            assert_eq!(summary.urls_claimed, 4);
            assert_eq!(summary.failures, 0);
            assert_eq!(web.fetched.lock().unwrap().len(), 4);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wide_graph_on_multi_thread_runtime() {
        // Every page links to every other page: maximum claim contention.
        let urls: Vec<String> = (0..40).map(|i| format!("http://h/{i}")).collect();
        let link_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let mut web = FakeWeb::default();
        for url in &urls {
            web = web.page(url, &link_refs);
        }

        let (crawler, _) = crawler(web, 8, 4);
        let sink = CollectSink::default();
        let summary = crawler.run("http://h/0", sink.clone()).await.unwrap();

        let crawled = sink.urls();
        let distinct: HashSet<_> = crawled.iter().collect();
        assert_eq!(crawled.len(), 40);
        assert_eq!(distinct.len(), 40);
        assert_eq!(summary.urls_claimed, 40);
        assert_eq!(summary.completion, Completion::Drained);
    }

    #[tokio::test]
    async fn test_referers_and_relative_resolution() {
        let web = FakeWeb::default()
            .page("http://h/a/b", &["c", "/x", "http://other/"])
            .page("http://h/a/c", &[])
            .page("http://h/x", &[]);
        let (crawler, _) = crawler(web, 2, 8);
        let sink = CollectSink::default();
        crawler.run("http://h/a/b", sink.clone()).await.unwrap();

        let by_url: HashMap<String, CrawlResult> = sink
            .results()
            .into_iter()
            .map(|r| (r.url.to_string(), r))
            .collect();

        assert_eq!(by_url.len(), 4);
        assert!(by_url["http://h/a/b"].referer.is_none());
        for child in ["http://h/a/c", "http://h/x", "http://other/"] {
            let referer = by_url[child].referer.as_ref().unwrap();
            assert_eq!(referer.as_str(), "http://h/a/b");
        }
        // Unknown pages come back as 404 pages, not errors.
        assert_eq!(by_url["http://other/"].status_code, 404);
        assert!(by_url["http://other/"].is_ok());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_isolated() {
        let web = FakeWeb::default()
            .page("http://h/", &["/broken", "/fine"])
            .with("http://h/broken", FakePage::Fail)
            .page("http://h/fine", &["/deep"])
            .page("http://h/deep", &[]);
        let (crawler, _) = crawler(web, 3, 8);
        let sink = CollectSink::default();
        let summary = crawler.run("http://h/", sink.clone()).await.unwrap();

        let results = sink.results();
        assert_eq!(results.len(), 4);
        let broken: Vec<_> = results
            .iter()
            .filter(|r| r.url.as_str() == "http://h/broken")
            .collect();
        assert_eq!(broken.len(), 1);
        assert!(broken[0].error.as_deref().unwrap().contains("connection refused"));
        assert_eq!(broken[0].status_code, 0);
        assert_eq!(broken[0].content_length, -1);
        assert!(results.iter().any(|r| r.url.as_str() == "http://h/deep"));
        assert_eq!(summary.failures, 1);
    }

    #[tokio::test]
    async fn test_truncated_body_keeps_status_and_follows_no_links() {
        let web = FakeWeb::default()
            .page("http://h/", &["/cut", "/fine"])
            .with(
                "http://h/cut",
                FakePage::BodyRead {
                    status: 206,
                    links: vec!["/hidden".to_string(), "/also-hidden".to_string()],
                },
            )
            .page("http://h/fine", &[])
            .page("http://h/hidden", &[])
            .page("http://h/also-hidden", &[]);
        let (crawler, web) = crawler(web, 2, 8);
        let sink = CollectSink::default();
        let summary = crawler.run("http://h/", sink.clone()).await.unwrap();

        let results = sink.results();
        let cut: Vec<_> = results
            .iter()
            .filter(|r| r.url.as_str() == "http://h/cut")
            .collect();
        assert_eq!(cut.len(), 1);
        assert_eq!(cut[0].status_code, 206);
        assert_eq!(cut[0].content_length, -1);
        assert!(cut[0].error.is_some());

        assert_eq!(
            sorted(sink.urls()),
            vec!["http://h/", "http://h/cut", "http://h/fine"]
        );
        assert!(!web.fetched.lock().unwrap().iter().any(|u| u.contains("hidden")));
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.urls_claimed, 3);
    }

    #[tokio::test]
    async fn test_tiny_queue_with_single_worker_does_not_deadlock() {
        let leaves: Vec<String> = (0..100).map(|i| format!("/leaf/{i}")).collect();
        let leaf_refs: Vec<&str> = leaves.iter().map(String::as_str).collect();
        let web = FakeWeb::default().page("http://h/", &leaf_refs);
        let (crawler, web) = crawler(web, 1, 1);
        let sink = CollectSink::default();

        let summary = tokio::time::timeout(Duration::from_secs(10), crawler.run("http://h/", sink.clone()))
            .await
            .expect("crawl should finish")
            .unwrap();

        assert_eq!(summary.results, 101);
        assert_eq!(sink.urls().len(), 101);
        // Leaves come out in the order they were found: one worker, FIFO queue.
        let fetched = web.fetched.lock().unwrap().clone();
        assert_eq!(fetched[0], "http://h/");
        assert_eq!(fetched[1], "http://h/leaf/0");
        assert_eq!(fetched[100], "http://h/leaf/99");
    }

    #[tokio::test]
    async fn test_cancellation_abandons_hung_fetches() {
        let web = FakeWeb::default()
            .page("http://h/", &["/slow", "/quick"])
            .with("http://h/slow", FakePage::Hang)
            .page("http://h/quick", &[]);
        let (crawler, _) = crawler(web, 4, 8);
        let sink = CollectSink::default();
        let cancel = CancellationToken::new();

        let trigger = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                cancel.cancel();
            })
        };

        let summary = tokio::time::timeout(
            Duration::from_secs(10),
            crawler.run_until("http://h/", sink.clone(), cancel),
        )
        .await
        .expect("cancelled crawl should return")
        .unwrap();
        trigger.await.unwrap();

        assert_eq!(summary.completion, Completion::Cancelled);
        let urls = sorted(sink.urls());
        assert_eq!(urls, vec!["http://h/", "http://h/quick"]);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let (crawler, _) = crawler(cyclic_web(), 2, 8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = crawler
            .run_until("http://h/a", CollectSink::default(), cancel)
            .await
            .unwrap();
        // The seed may or may not have been fetched; the run must still end.
        assert!(summary.results <= 1);
    }

    #[tokio::test]
    async fn test_panicking_fetch_becomes_error_result() {
        let web = FakeWeb::default()
            .page("http://h/", &["/boom", "/ok"])
            .with("http://h/boom", FakePage::Panic)
            .page("http://h/ok", &[]);
        let (crawler, _) = crawler(web, 2, 8);
        let sink = CollectSink::default();
        let summary = crawler.run("http://h/", sink.clone()).await.unwrap();

        assert_eq!(summary.completion, Completion::Drained);
        let boom: Vec<_> = sink
            .results()
            .into_iter()
            .filter(|r| r.url.as_str() == "http://h/boom")
            .collect();
        assert_eq!(boom.len(), 1);
        assert!(boom[0].error.as_deref().unwrap().contains("fetcher blew up"));
        assert_eq!(sink.results().len(), 3);
    }

    #[tokio::test]
    async fn test_sink_failures_do_not_stop_the_crawl() {
        let (crawler, _) = crawler(cyclic_web(), 2, 8);
        let summary = crawler.run("http://h/a", FailingSink).await.unwrap();
        assert_eq!(summary.completion, Completion::Drained);
        assert_eq!(summary.results, 4);
        assert_eq!(summary.sink_errors, 4);
    }

    #[tokio::test]
    async fn test_bodies_only_delivered_when_wanted() {
        let (crawler, _) = crawler(cyclic_web(), 2, 8);

        let plain = CollectSink::default();
        crawler.run("http://h/a", plain.clone()).await.unwrap();
        assert!(plain.deliveries.lock().unwrap().iter().all(|d| d.body.is_none()));

        let wants = CollectSink {
            want_body: true,
            ..CollectSink::default()
        };
        crawler.run("http://h/a", wants.clone()).await.unwrap();
        let deliveries = wants.deliveries.lock().unwrap();
        let seed = deliveries
            .iter()
            .find(|d| d.result.url.as_str() == "http://h/a")
            .unwrap();
        let body = String::from_utf8(seed.body.clone().unwrap()).unwrap();
        assert!(body.contains("href=\"/b\""));
    }

    #[tokio::test]
    async fn test_progress_counts_discovered_links() {
        let (crawler, _) = crawler(cyclic_web(), 1, 8);
        let sink = CollectSink::default();
        crawler.run("http://h/a", sink.clone()).await.unwrap();

        let deliveries = sink.deliveries.lock().unwrap();
        let last = deliveries.last().unwrap().progress;
        // b, c and d were discovered; the seed is not a discovered link.
        assert_eq!(last.links_found, 3);
        assert_eq!(last.requests_made, 4);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_fatal() {
        let (crawler, _) = crawler(cyclic_web(), 2, 8);
        let err = crawler
            .run("not a url", CollectSink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidSeed { .. }));
    }

    #[tokio::test]
    async fn test_zero_workers_is_fatal() {
        let (crawler, _) = crawler(cyclic_web(), 0, 8);
        let err = crawler
            .run("http://h/a", CollectSink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Config(ConfigError::ZeroConcurrency)));
    }
}
