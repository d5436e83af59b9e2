//! Event-stream handling for proxied responses
//!
//! Server-sent event streams must reach the browser as the backend produces
//! them. The proxy itself relays chunk by chunk; these headers tell any
//! intermediary (nginx, CDNs, the browser cache) not to hold the stream back.

use crate::utils::header_str;
use hyper::header::{HeaderName, HeaderValue, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use hyper::HeaderMap;

/// Content type of a server-sent event stream
pub const EVENT_STREAM: &str = "text/event-stream";

/// Header honoured by nginx and compatible proxies to disable response buffering
pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Whether the response declares exactly `text/event-stream`
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    header_str(headers, CONTENT_TYPE) == Some(EVENT_STREAM)
}

/// Rewrite headers of an event-stream response so nothing buffers it.
///
/// Returns whether the rewrite applied. Other content types are left as is.
pub fn disable_buffering_for_event_stream(headers: &mut HeaderMap) -> bool {
    if !is_event_stream(headers) {
        return false;
    }

    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    true
}
