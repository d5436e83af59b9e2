//! Network sink backed by a hyper body channel

use super::ResponseSink;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use hyper::body::Sender;
use hyper::{Body, HeaderMap, Response, StatusCode};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

/// Receives the response head once the handler commits it
pub type HeadReceiver = oneshot::Receiver<Response<Body>>;

/// Response body handed to hyper. Dropping it drops `_departed`, which tells
/// the sink the client is gone.
struct WatchedBody {
    inner: Body,
    _departed: oneshot::Sender<()>,
}

impl Stream for WatchedBody {
    type Item = hyper::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Sink that hands a streaming `Response<Body>` to hyper.
///
/// The head (status and headers) is sent on the first body write, on
/// [`flush`](ResponseSink::flush), or when the sink is finished, whichever
/// comes first. Body chunks then travel through a hyper body channel one at a
/// time, so nothing is held back.
pub struct HyperSink {
    head: Option<oneshot::Sender<Response<Body>>>,
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Sender>,
    departed: Option<oneshot::Receiver<()>>,
    client_gone: bool,
}

impl HyperSink {
    /// Create a sink and the receiver the server awaits for the response head
    pub fn new() -> (Self, HeadReceiver) {
        let (tx, rx) = oneshot::channel();
        let sink = Self {
            head: Some(tx),
            status: None,
            headers: HeaderMap::new(),
            body: None,
            departed: None,
            client_gone: false,
        };
        (sink, rx)
    }

    /// Whether the response head has already been handed to hyper
    pub fn is_committed(&self) -> bool {
        self.head.is_none()
    }

    fn commit(&mut self) -> io::Result<()> {
        let Some(head) = self.head.take() else {
            return Ok(());
        };

        let (sender, body) = Body::channel();
        let (departed_tx, departed_rx) = oneshot::channel();
        let body = Body::wrap_stream(WatchedBody {
            inner: body,
            _departed: departed_tx,
        });

        let mut response = Response::new(body);
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = std::mem::take(&mut self.headers);

        head.send(response).map_err(|_| {
            self.client_gone = true;
            io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected before response head")
        })?;
        self.body = Some(sender);
        self.departed = Some(departed_rx);
        Ok(())
    }

    /// Commit the head if the handler never did, then close the body
    pub fn finish(mut self) {
        if let Err(e) = self.commit() {
            debug!("Response head not delivered: {}", e);
        }
    }

    /// Terminate the body abnormally so the client sees a truncated response.
    ///
    /// A response whose head was never sent is finished normally instead.
    pub fn abort(mut self) {
        match self.body.take() {
            Some(sender) => sender.abort(),
            None => self.finish(),
        }
    }
}

#[async_trait]
impl ResponseSink for HyperSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.is_committed() || self.status.is_some() {
            debug!("Ignoring superfluous status {} (already committed)", status);
            return;
        }
        self.status = Some(status);
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<usize> {
        self.commit()?;

        let len = chunk.len();
        if len == 0 {
            return Ok(0);
        }

        let sender = self
            .body
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"))?;
        sender
            .send_data(chunk)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))?;
        Ok(len)
    }

    async fn closed(&mut self) {
        if self.client_gone {
            return;
        }
        if let Some(head) = self.head.as_mut() {
            head.closed().await;
            return;
        }
        match self.departed.as_mut() {
            // Resolves with an error once hyper drops the response body
            Some(departed) => {
                let _ = departed.await;
                self.client_gone = true;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::HttpBody;

    #[tokio::test]
    async fn test_head_committed_on_first_write() {
        let (mut sink, head) = HyperSink::new();
        sink.headers_mut()
            .insert("content-type", "text/plain".parse().unwrap());
        sink.set_status(StatusCode::CREATED);

        let writer = tokio::spawn(async move {
            sink.write(Bytes::from_static(b"first")).await.unwrap();
            sink.write(Bytes::from_static(b"second")).await.unwrap();
            sink.finish();
        });

        let response = head.await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "text/plain");

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"firstsecond");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_first_status_wins() {
        let (mut sink, head) = HyperSink::new();
        sink.set_status(StatusCode::NOT_FOUND);
        sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        sink.finish();

        let response = head.await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_after_write_is_ignored() {
        let (mut sink, head) = HyperSink::new();
        let writer = tokio::spawn(async move {
            sink.write(Bytes::from_static(b"ok")).await.unwrap();
            sink.set_status(StatusCode::BAD_REQUEST);
            sink.finish();
        });

        let response = head.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"ok");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_finish_without_writes_sends_empty_200() {
        let (sink, head) = HyperSink::new();
        sink.finish();

        let mut response = head.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body_mut().data().await.is_none());
    }

    #[tokio::test]
    async fn test_write_fails_when_client_is_gone() {
        let (mut sink, head) = HyperSink::new();
        drop(head);

        let err = sink.write(Bytes::from_static(b"lost")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_closed_resolves_when_receiver_dropped() {
        let (mut sink, head) = HyperSink::new();
        drop(head);
        tokio::time::timeout(std::time::Duration::from_secs(1), sink.closed())
            .await
            .expect("closed() should resolve once the head receiver is gone");
    }

    #[tokio::test]
    async fn test_flush_sends_head_before_body() {
        let (mut sink, head) = HyperSink::new();
        sink.headers_mut()
            .insert("content-type", "text/event-stream".parse().unwrap());
        sink.flush().await.unwrap();
        sink.set_status(StatusCode::NOT_FOUND);

        let response = tokio::time::timeout(std::time::Duration::from_secs(1), head)
            .await
            .expect("head should be sent without any body bytes")
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        sink.write_all(Bytes::from_static(b"data: x\n\n")).await.unwrap();
        sink.finish();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"data: x\n\n");
    }

    #[tokio::test]
    async fn test_closed_resolves_when_body_dropped_mid_stream() {
        let (mut sink, head) = HyperSink::new();
        sink.flush().await.unwrap();
        let response = head.await.unwrap();

        let watcher = tokio::spawn(async move {
            sink.closed().await;
            // Stays resolved once the client is gone
            sink.closed().await;
        });
        drop(response);

        tokio::time::timeout(std::time::Duration::from_secs(1), watcher)
            .await
            .expect("closed() should resolve once the response body is dropped")
            .unwrap();
    }

    #[tokio::test]
    async fn test_abort_truncates_streaming_body() {
        let (mut sink, head) = HyperSink::new();
        let writer = tokio::spawn(async move {
            sink.write(Bytes::from_static(b"partial")).await.unwrap();
            sink.abort();
        });

        let response = head.await.unwrap();
        let result = hyper::body::to_bytes(response.into_body()).await;
        assert!(result.is_err());
        writer.await.unwrap();
    }
}
