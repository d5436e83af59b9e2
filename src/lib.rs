//! Access-log middleware and a streaming-aware reverse proxy
//!
//! Handlers write their responses through a [`ResponseSink`](sink::ResponseSink).
//! The [`AccessLog`] middleware observes the status and byte count flowing
//! through the sink and writes one Combined Log Format line per request.
//! Two servers are built from these pieces: a hello-world demonstration server
//! and a chat UI server that relays API calls to a backend without buffering
//! event streams.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod proxy;
pub mod runtime;
pub mod server;
pub mod sink;
pub mod utils;

// Re-export commonly used items
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use handlers::{Handler, HelloHandler, UiRouter};
pub use logging::{init_logger_with_config, AccessLogWriter};
pub use middleware::{AccessLog, ResponseRecorder};
pub use models::{AccessLogLine, RequestRecord};
pub use proxy::{BackendClient, ReverseProxy};
pub use server::HttpServer;
pub use sink::{HyperSink, ResponseSink};
