// src/sink/mod.rs
// =============================================================================
// Where crawl results go.
//
// Submodules:
// - console: one progress line per result on stdout
// - jsonl:   one JSON object per result, to any writer
// - store:   content-addressed files on disk (result + raw body)
// - graph:   a node per page in a Neo4j database
// - tee:     fan one result out to two sinks
//
// The engine drives a sink from a single task that reads a bounded results
// channel, so a sink never has to worry about being called concurrently. A
// slow sink simply makes workers wait on that channel.
//
// A sink that fails to persist a result returns an error; the engine logs it,
// counts it, and carries on. The page still counts as crawled.
// =============================================================================

mod console;
mod graph;
mod jsonl;
mod store;
mod tee;

use async_trait::async_trait;

use crate::crawl::Progress;
use crate::error::SinkError;
use crate::result::CrawlResult;

pub use console::ConsoleSink;
pub use graph::GraphSink;
pub use jsonl::JsonLinesSink;
pub use store::ContentStore;
pub use tee::Tee;

/// Everything a sink receives for one completed job.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub result: CrawlResult,
    /// Raw response body; only present when the sink asked for bodies and the
    /// fetch succeeded.
    pub body: Option<Vec<u8>>,
    /// Crawl counters at the moment the result reached the sink.
    pub progress: Progress,
}

#[async_trait]
pub trait ResultSink: Send {
    /// Whether the engine should keep raw bodies around for this sink.
    fn wants_body(&self) -> bool {
        false
    }

    /// Called exactly once per completed job.
    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError>;

    /// Called once after the last result.
    async fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn wants_body(&self) -> bool {
        (**self).wants_body()
    }

    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
        (**self).accept(delivery).await
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush().await
    }
}
