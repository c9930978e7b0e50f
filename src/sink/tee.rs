// src/sink/tee.rs
// Sends every result to two sinks, e.g. graph nodes plus the console line.
//
// Both sinks always see every call; one failing never starves the other. If
// both fail, the first sink's error is the one reported.

use async_trait::async_trait;

use super::{Delivery, ResultSink};
use crate::error::SinkError;

pub struct Tee<A, B>(pub A, pub B);

#[async_trait]
impl<A: ResultSink, B: ResultSink> ResultSink for Tee<A, B> {
    fn wants_body(&self) -> bool {
        self.0.wants_body() || self.1.wants_body()
    }

    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
        let first = self.0.accept(delivery).await;
        let second = self.1.accept(delivery).await;
        first.and(second)
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        let first = self.0.flush().await;
        let second = self.1.flush().await;
        first.and(second)
    }
}
