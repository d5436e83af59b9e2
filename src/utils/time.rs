//! Time utility functions

use chrono::{DateTime, FixedOffset, Local};

/// Timestamp layout used by Combined Log Format, e.g. `02/Jan/2006:15:04:05 -0700`
pub const CLF_TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Current wall-clock time in the local zone with its numeric offset
pub fn now_local() -> DateTime<FixedOffset> {
    DateTime::<FixedOffset>::from(Local::now())
}

/// Format a timestamp for an access log line
pub fn format_clf_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(CLF_TIMESTAMP_FORMAT).to_string()
}
