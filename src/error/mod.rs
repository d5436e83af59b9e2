//! Error handling module for the access-log servers

use thiserror::Error;

/// Custom error type for the servers and the proxy
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("Request building error: {0}")]
    RequestBuild(#[from] hyper::http::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream connection error: {0}")]
    UpstreamConnection(String),

    #[error("Client went away: {0}")]
    Cancelled(String),
}

/// Result type for the servers
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("bad listen address".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad listen address");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client disconnected");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("client disconnected"));
    }
}
