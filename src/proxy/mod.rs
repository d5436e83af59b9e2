//! Reverse proxy to a single backend origin

pub mod http_client;
pub mod reverse;
pub mod streaming;

#[cfg(test)]
pub(crate) mod test_backend;

// Re-exports
pub use http_client::{BackendClient, ClientConfig};
pub use reverse::ReverseProxy;
pub use streaming::{disable_buffering_for_event_stream, is_event_stream};
