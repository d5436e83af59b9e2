//! Response recorder: a pass-through sink that remembers what was sent

use crate::sink::ResponseSink;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, StatusCode};
use std::io;

/// Decorates a sink, capturing the status and byte count the client received.
///
/// Status capture follows the wire: the first `set_status` before any body
/// write is what gets logged. Later calls are still forwarded so the wrapped
/// sink sees them, but they do not change the recorded code.
pub struct ResponseRecorder<'a> {
    inner: &'a mut dyn ResponseSink,
    status: StatusCode,
    committed: bool,
    bytes_written: u64,
}

impl<'a> ResponseRecorder<'a> {
    pub fn new(inner: &'a mut dyn ResponseSink) -> Self {
        Self {
            inner,
            status: StatusCode::OK,
            committed: false,
            bytes_written: 0,
        }
    }

    /// Status the response went out with (200 unless declared otherwise)
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Total bytes the wrapped sink accepted
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[async_trait]
impl<'a> ResponseSink for ResponseRecorder<'a> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        if !self.committed {
            self.status = status;
            self.committed = true;
        }
        self.inner.set_status(status);
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<usize> {
        self.committed = true;
        let written = self.inner.write(chunk).await?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.committed = true;
        self.inner.flush().await
    }

    async fn closed(&mut self) {
        self.inner.closed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::MemorySink;

    #[tokio::test]
    async fn test_default_status_is_200() {
        let mut sink = MemorySink::new();
        let mut recorder = ResponseRecorder::new(&mut sink);

        recorder.write(Bytes::from_static(b"Hello")).await.unwrap();

        assert_eq!(recorder.status(), StatusCode::OK);
        assert_eq!(recorder.bytes_written(), 5);
    }

    #[tokio::test]
    async fn test_explicit_status_is_recorded_and_forwarded() {
        let mut sink = MemorySink::new();
        {
            let mut recorder = ResponseRecorder::new(&mut sink);
            recorder.set_status(StatusCode::NOT_FOUND);
            recorder
                .write_all(Bytes::from_static(b"not found"))
                .await
                .unwrap();

            assert_eq!(recorder.status(), StatusCode::NOT_FOUND);
            assert_eq!(recorder.bytes_written(), 9);
        }
        assert_eq!(sink.wire_status(), StatusCode::NOT_FOUND);
        assert_eq!(sink.body_str(), "not found");
    }

    #[tokio::test]
    async fn test_repeated_status_matches_wire() {
        let mut sink = MemorySink::new();
        let recorded = {
            let mut recorder = ResponseRecorder::new(&mut sink);
            recorder.set_status(StatusCode::ACCEPTED);
            recorder.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            recorder.status()
        };

        assert_eq!(recorded, StatusCode::ACCEPTED);
        assert_eq!(sink.wire_status(), recorded);
    }

    #[tokio::test]
    async fn test_status_after_body_is_not_recorded() {
        let mut sink = MemorySink::new();
        let recorded = {
            let mut recorder = ResponseRecorder::new(&mut sink);
            recorder.write(Bytes::from_static(b"body")).await.unwrap();
            recorder.set_status(StatusCode::BAD_GATEWAY);
            recorder.status()
        };

        assert_eq!(recorded, StatusCode::OK);
        assert_eq!(sink.wire_status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_flush_commits_status_without_bytes() {
        let mut sink = MemorySink::new();
        let (recorded, bytes) = {
            let mut recorder = ResponseRecorder::new(&mut sink);
            recorder.set_status(StatusCode::ACCEPTED);
            recorder.flush().await.unwrap();
            recorder.set_status(StatusCode::BAD_GATEWAY);
            (recorder.status(), recorder.bytes_written())
        };

        assert_eq!(recorded, StatusCode::ACCEPTED);
        assert_eq!(bytes, 0);
        assert_eq!(sink.wire_status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_flush_without_status_records_200() {
        let mut sink = MemorySink::new();
        let recorded = {
            let mut recorder = ResponseRecorder::new(&mut sink);
            recorder.flush().await.unwrap();
            recorder.set_status(StatusCode::NOT_FOUND);
            recorder.status()
        };

        assert_eq!(recorded, StatusCode::OK);
        assert_eq!(sink.wire_status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_partial_writes_count_accepted_bytes_only() {
        let mut sink = MemorySink::new();
        sink.max_per_write = Some(4);
        let mut recorder = ResponseRecorder::new(&mut sink);

        let written = recorder
            .write(Bytes::from_static(b"Hello, World!"))
            .await
            .unwrap();

        assert_eq!(written, 4);
        assert_eq!(recorder.bytes_written(), 4);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_credited() {
        let mut sink = MemorySink::new();
        sink.failing_writes = vec![1];
        let mut recorder = ResponseRecorder::new(&mut sink);

        recorder.write(Bytes::from_static(b"abc")).await.unwrap();
        let err = recorder
            .write(Bytes::from_static(b"defgh"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        recorder.write(Bytes::from_static(b"ij")).await.unwrap();

        assert_eq!(recorder.bytes_written(), 5);
    }

    #[tokio::test]
    async fn test_headers_pass_through() {
        let mut sink = MemorySink::new();
        {
            let mut recorder = ResponseRecorder::new(&mut sink);
            recorder
                .headers_mut()
                .insert("content-type", "text/plain".parse().unwrap());
        }
        assert_eq!(sink.headers["content-type"], "text/plain");
    }
}
