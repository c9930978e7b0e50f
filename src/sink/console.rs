// src/sink/console.rs
// Prints one progress line per result:
//   COUNT: <requests made>, LINKS: <links found>, REQ RECEIVED: <url>

use std::io::{self, Write};

use async_trait::async_trait;

use super::{Delivery, ResultSink};
use crate::error::SinkError;

pub struct ConsoleSink<W = io::Stdout> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> ResultSink for ConsoleSink<W> {
    async fn accept(&mut self, delivery: &Delivery) -> Result<(), SinkError> {
        let progress = delivery.progress;
        writeln!(
            self.out,
            "COUNT: {}, LINKS: {}, REQ RECEIVED: {}",
            progress.requests_made, progress.links_found, delivery.result.url
        )
        .map_err(console_error)
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush().map_err(console_error)
    }
}

fn console_error(source: io::Error) -> SinkError {
    SinkError::Io {
        path: "<console>".to_string(),
        source,
    }
}
