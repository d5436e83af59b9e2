//! Access logging middleware
//!
//! Wraps any [`Handler`] and writes one Combined Log Format line plus one
//! duration line per request, after the wrapped handler returns.

use crate::handlers::Handler;
use crate::logging::AccessLogWriter;
use crate::middleware::recorder::ResponseRecorder;
use crate::models::{AccessLogLine, RecordOptions, RequestRecord};
use crate::sink::ResponseSink;
use crate::utils::now_local;
use crate::Result;
use async_trait::async_trait;
use hyper::{Body, Request};
use std::time::Instant;
use tracing::debug;

/// Middleware that logs every request passing through the wrapped handler
pub struct AccessLog<H> {
    inner: H,
    writer: AccessLogWriter,
    options: RecordOptions,
}

impl<H: Handler> AccessLog<H> {
    pub fn new(inner: H, writer: AccessLogWriter) -> Self {
        Self::with_options(inner, writer, RecordOptions::default())
    }

    pub fn with_options(inner: H, writer: AccessLogWriter, options: RecordOptions) -> Self {
        Self {
            inner,
            writer,
            options,
        }
    }
}

#[async_trait]
impl<H: Handler> Handler for AccessLog<H> {
    async fn serve(&self, req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()> {
        let start = Instant::now();
        let record = RequestRecord::from_request(&req, now_local(), self.options);

        let mut recorder = ResponseRecorder::new(sink);
        let result = self.inner.serve(req, &mut recorder).await;
        let elapsed = start.elapsed();

        let line = AccessLogLine::new(
            &record,
            recorder.status().as_u16(),
            recorder.bytes_written(),
        );
        debug!(
            method = %record.method,
            path = %record.path,
            status = line.status,
            bytes = line.bytes_written,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "request completed"
        );
        self.writer.write_entry(&line.to_string(), elapsed);

        result
    }
}
