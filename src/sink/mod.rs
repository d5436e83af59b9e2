//! Response sinks
//!
//! A [`ResponseSink`] is anything a handler can send a response through: a
//! status, headers staged before the head goes out, and body bytes. The real
//! network sink is [`HyperSink`]; decorators such as the access-log recorder
//! implement the same trait and forward to the sink they wrap.

pub mod hyper_sink;

pub use hyper_sink::HyperSink;

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use hyper::{HeaderMap, StatusCode};
use std::io;

/// Capability to send one HTTP response
#[async_trait]
pub trait ResponseSink: Send {
    /// Headers that will be sent with the response head.
    ///
    /// Changes made after the head has been committed are not sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Declare the response status. Only the first call before any body write
    /// takes effect; the head is committed with 200 on the first write when no
    /// status was declared.
    fn set_status(&mut self, status: StatusCode);

    /// Send body bytes, returning how many the sink accepted
    async fn write(&mut self, chunk: Bytes) -> io::Result<usize>;

    /// Send the response head now, even before any body bytes exist.
    ///
    /// Status and headers become final, as after a write.
    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Resolves once the client is no longer listening
    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }

    /// Send the whole chunk, retrying on partial writes
    async fn write_all(&mut self, mut chunk: Bytes) -> io::Result<()> {
        while !chunk.is_empty() {
            let written = self.write(chunk.clone()).await?;
            if written == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "response sink accepted no bytes",
                ));
            }
            chunk.advance(written);
        }
        Ok(())
    }
}
