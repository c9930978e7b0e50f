// src/sink/jsonl.rs
// One JSON object per line, one line per result.

use std::io::{self, Write};

use async_trait::async_trait;

use super::{Delivery, ResultSink};
use crate::error::SinkError;

pub struct JsonLinesSink<W = io::Stdout> {
    out: W,
    label: String,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "<stdout>")
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// `label` names the destination in error messages.
    pub fn new(out: W, label: impl Into<String>) -> Self {
        Self {
            out,
            label: label.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn io_error(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            path: self.label.clone(),
            source,
        }
    }
}

#[async_trait]
impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&delivery.result)?;
        line.push(b'\n');
        self.out.write_all(&line).map_err(|e| self.io_error(e))
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush().map_err(|e| self.io_error(e))
    }
}
