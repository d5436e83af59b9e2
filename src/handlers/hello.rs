//! Hello-world handler for the demonstration server

use super::Handler;
use crate::sink::ResponseSink;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request};

const GREETING: &[u8] = b"Hello, World!";

/// Answers every path with `Hello, World!`
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloHandler;

#[async_trait]
impl Handler for HelloHandler {
    async fn serve(&self, _req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()> {
        sink.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        sink.write_all(Bytes::from_static(GREETING)).await?;
        Ok(())
    }
}
