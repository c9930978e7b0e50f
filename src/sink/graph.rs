// src/sink/graph.rs
// =============================================================================
// Writes each crawled page as a node in a Neo4j graph database, through the
// database's REST API.
//
// For every result:
// 1. POST {db}/node with the node's properties
//      { url, referer, err, statusCode, duration, contentLength }
//    -> 201 Created, with the new node's URL in the "self" field
// 2. POST {node}/labels with "Website"
//
// `referer` and `err` are empty strings when absent, and `duration` is in
// nanoseconds, which is how existing graphs built by the crawler store them.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{Delivery, ResultSink};
use crate::error::SinkError;

pub const NODE_LABEL: &str = "Website";

pub struct GraphSink {
    client: Client,
    node_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct CreatedNode {
    #[serde(rename = "self")]
    location: String,
}

impl GraphSink {
    /// `db_url` is the REST root, e.g. `http://localhost:7474/db/data`.
    pub fn new(db_url: &Url) -> Self {
        Self::with_client(Client::new(), db_url)
    }

    pub fn with_client(client: Client, db_url: &Url) -> Self {
        let node_endpoint = format!("{}/node", db_url.as_str().trim_end_matches('/'));
        Self {
            client,
            node_endpoint,
        }
    }

    async fn create_node(&self, delivery: &Delivery) -> Result<String, SinkError> {
        let result = &delivery.result;
        let properties = json!({
            "url": result.url.as_str(),
            "referer": result.referer.as_ref().map(Url::as_str).unwrap_or(""),
            "err": result.error.as_deref().unwrap_or(""),
            "statusCode": result.status_code,
            "duration": u64::try_from(result.duration.as_nanos()).unwrap_or(u64::MAX),
            "contentLength": result.content_length,
        });

        let response = self
            .client
            .post(&self.node_endpoint)
            .json(&properties)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                operation: "create node",
                status: status.as_u16(),
            });
        }

        let created: CreatedNode = response.json().await?;
        Ok(created.location)
    }

    async fn add_label(&self, node: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(format!("{}/labels", node.trim_end_matches('/')))
            .json(&NODE_LABEL)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                operation: "add label",
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResultSink for GraphSink {
    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
        let node = self.create_node(delivery).await?;
        self.add_label(&node).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{Job, Progress};
    use crate::fetch::FetchedPage;
    use crate::result::CrawlResult;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn delivery() -> Delivery {
        let job = Job::discovered(
            Url::parse("http://h/a").unwrap(),
            Url::parse("http://h/").unwrap(),
        );
        let page = FetchedPage {
            status_code: 200,
            content_length: Some(10),
            body: Vec::new(),
        };
        Delivery {
            result: CrawlResult::fetched(&job, &page, Duration::from_millis(2)),
            body: None,
            progress: Progress::default(),
        }
    }

    #[tokio::test]
    async fn test_creates_labelled_node() {
        let server = MockServer::start().await;
        let node_url = format!("{}/db/data/node/7", server.uri());

        Mock::given(method("POST"))
            .and(path("/db/data/node"))
            .and(body_json(json!({
                "url": "http://h/a",
                "referer": "http://h/",
                "err": "",
                "statusCode": 200,
                "duration": 2_000_000u64,
                "contentLength": 10,
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "self": node_url })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/db/data/node/7/labels"))
            .and(body_json(json!("Website")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let db = Url::parse(&format!("{}/db/data/", server.uri())).unwrap();
        let mut sink = GraphSink::new(&db);
        sink.accept(&delivery()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_node_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/data/node"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let db = Url::parse(&format!("{}/db/data", server.uri())).unwrap();
        let mut sink = GraphSink::new(&db);
        let err = sink.accept(&delivery()).await.unwrap_err();
        assert!(matches!(
            err,
            SinkError::Rejected {
                operation: "create node",
                status: 500
            }
        ));
    }
}
