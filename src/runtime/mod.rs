//! Runtime utilities for creating single-threaded vs multi-threaded Tokio runtimes

use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};
use tracing::{info, warn};

/// Create a Tokio runtime based on the configuration
pub fn create_runtime(config: &RuntimeConfig) -> Result<Runtime> {
    match config.mode.as_str() {
        "single_threaded" => {
            info!("Initializing single-threaded runtime");
            Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create single-threaded runtime")
        }
        "multi_threaded" => {
            let mut builder = Builder::new_multi_thread();
            builder.enable_all();

            match config.worker_threads {
                Some(threads) if threads > 0 => {
                    info!("Initializing multi-threaded runtime with {} worker threads", threads);
                    builder.worker_threads(threads);
                }
                _ => info!("Initializing multi-threaded runtime with auto-detected CPU cores"),
            }

            builder
                .build()
                .context("Failed to create multi-threaded runtime")
        }
        other => {
            warn!("Unknown runtime mode '{}', defaulting to multi-threaded", other);
            Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create default multi-threaded runtime")
        }
    }
}

/// Execute an async function with the configured runtime
pub fn run_with_runtime<F, T>(config: &RuntimeConfig, future: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let runtime = create_runtime(config)?;
    runtime.block_on(future)
}
