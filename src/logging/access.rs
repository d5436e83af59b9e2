//! Access log destination
//!
//! Access log lines bypass `tracing` so their bytes stay exactly in Combined
//! Log Format. Lines are handed to a `tracing_appender` worker thread, so a
//! slow disk or a blocked stdout never stalls a request task. Every line goes
//! over as a single message, so concurrent requests never interleave inside a
//! line.

use crate::error::Result;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

/// Shared, cloneable handle to the access log output.
///
/// The worker thread drains and stops once the last clone is dropped.
#[derive(Clone)]
pub struct AccessLogWriter {
    writer: NonBlocking,
    _guard: Arc<WorkerGuard>,
    destination: String,
}

impl AccessLogWriter {
    /// Write access log lines to standard output
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout(), "stdout")
    }

    /// Append access log lines to a file, creating it if needed
    pub fn append_to_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file, &path.display().to_string()))
    }

    /// File destination when configured, stdout otherwise
    pub fn from_config(log_file: Option<&PathBuf>) -> Result<Self> {
        match log_file {
            Some(path) => Self::append_to_file(path),
            None => Ok(Self::stdout()),
        }
    }

    /// Wrap an arbitrary writer behind a dedicated worker thread
    pub fn from_writer<W: Write + Send + 'static>(writer: W, destination: &str) -> Self {
        // Access lines are records, not diagnostics: back-pressure instead of dropping
        let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(writer);
        Self {
            writer,
            _guard: Arc::new(guard),
            destination: destination.to_string(),
        }
    }

    /// Human readable name of the destination
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Queue one complete line, appending the trailing newline
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut writer = self.writer.clone();
        writer.write_all(&buf)
    }

    /// Write the access line followed by the processing duration line.
    ///
    /// Failures are reported through diagnostics only; a broken log sink must
    /// not affect the response.
    pub fn write_entry(&self, access_line: &str, elapsed: Duration) {
        if let Err(e) = self.write_line(access_line) {
            debug!("Failed to write access log line to {}: {}", self.destination, e);
            return;
        }
        if let Err(e) = self.write_line(&format!("Request processed in {:?}", elapsed)) {
            debug!("Failed to write duration line to {}: {}", self.destination, e);
        }
    }
}

impl std::fmt::Debug for AccessLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLogWriter")
            .field("destination", &self.destination)
            .finish()
    }
}
