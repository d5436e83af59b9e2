//! Request handlers
//!
//! A [`Handler`] consumes a request and produces its response through a
//! [`ResponseSink`]. Handlers compose: middleware such as
//! [`AccessLog`](crate::middleware::AccessLog) is itself a handler wrapping
//! another one.

pub mod hello;
pub mod ui;

pub use hello::HelloHandler;
pub use ui::{Route, UiRouter};

use crate::sink::ResponseSink;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use hyper::{Body, Request, StatusCode};
use std::sync::Arc;

/// Something that can answer a request
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Produce the response for `req` through `sink`.
    ///
    /// Errors are returned to the caller untouched; whatever was already
    /// written stays written.
    async fn serve(&self, req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()>;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn serve(&self, req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()> {
        (**self).serve(req, sink).await
    }
}

/// Plain-text 404 response
pub async fn not_found(sink: &mut dyn ResponseSink) -> Result<()> {
    let headers = sink.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    sink.set_status(StatusCode::NOT_FOUND);
    sink.write_all(Bytes::from_static(b"404 page not found\n")).await?;
    Ok(())
}
