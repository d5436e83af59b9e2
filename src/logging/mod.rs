//! Diagnostic logging setup and access log output

pub mod access;

pub use access::AccessLogWriter;

use log::{debug, error, info, warn, LevelFilter};
use std::path::Path;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initialize logger from the configured level, optionally writing to a log directory.
///
/// `RUST_LOG`-style directives are accepted as the level. The returned guard
/// flushes the file writer on drop and must be held for the lifetime of the
/// process.
pub fn init_logger_with_config(log_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let mut guard = None;

    INIT.call_once(|| {
        let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

        let installed = match log_dir {
            Some(dir) => {
                let appender = tracing_appender::rolling::never(dir, "server.log");
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                let subscriber = FmtSubscriber::builder()
                    .with_env_filter(filter)
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .finish();
                tracing::subscriber::set_global_default(subscriber)
            }
            None => {
                let subscriber = FmtSubscriber::builder()
                    .with_env_filter(filter)
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr)
                    .finish();
                tracing::subscriber::set_global_default(subscriber)
            }
        };
        if let Err(e) = installed {
            eprintln!("Warning: Failed to install tracing subscriber: {}", e);
        }

        bridge_log_crate();
        log::set_max_level(
            log_level
                .parse::<LevelFilter>()
                .unwrap_or(LevelFilter::Info),
        );
    });

    guard
}

/// Initialize LogTracer to bridge log events to tracing (after subscriber is set up)
fn bridge_log_crate() {
    if let Err(e) = LogTracer::init() {
        eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
    }
}

/// Log an error message
pub fn log_error(message: &str) {
    error!("{}", message);
}

/// Log an info message
pub fn log_info(message: &str) {
    info!("{}", message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    warn!("{}", message);
}

/// Log a debug message
pub fn log_debug(message: &str) {
    debug!("{}", message);
}

/// Convenience macro for logging errors
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error(&format!($($arg)*));
    };
}

/// Convenience macro for logging info messages
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info(&format!($($arg)*));
    };
}

/// Convenience macro for logging warning messages
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logging::log_warning(&format!($($arg)*));
    };
}

/// Convenience macro for logging debug messages
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_debug(&format!($($arg)*));
    };
}
