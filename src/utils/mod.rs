//! Utility functions for the servers

pub mod http;
pub mod time;
pub mod url;

pub use self::http::*;
pub use self::time::*;
pub use self::url::*;
