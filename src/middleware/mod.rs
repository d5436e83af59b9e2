//! Middleware wrapping request handlers

pub mod access_log;
pub mod recorder;

pub use access_log::AccessLog;
pub use recorder::ResponseRecorder;
