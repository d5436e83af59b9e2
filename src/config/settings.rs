//! Server configuration settings

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

/// Default backend the UI server proxies API calls to
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Main configuration shared by the hello and UI servers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server listening address
    pub listen_addr: SocketAddr,

    /// Log level configuration for diagnostic logs
    pub log_level: String,

    /// Access log configuration
    pub access_log: AccessLogConfig,

    /// Diagnostic logging configuration
    pub logging: LoggingConfig,

    /// UI server and proxy configuration
    pub ui: UiConfig,

    /// Backend HTTP client configuration
    pub http_client: HttpClientConfig,

    /// Runtime configuration
    pub runtime: RuntimeConfig,
}

/// Access log configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Append access log lines to this file instead of stdout
    pub log_file: Option<PathBuf>,

    /// Use the X-Forwarded-For header as the client address when present
    pub trust_forwarded_for: bool,

    /// Log the request URI with its query string instead of the bare path
    pub include_query: bool,
}

/// Diagnostic logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for diagnostic log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

/// UI server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Backend base URL for the proxied API paths
    pub api_url: String,
}

/// Backend HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host
    pub max_idle_per_host: usize,

    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Enable TCP keepalive
    pub tcp_keepalive: bool,

    /// TCP keepalive interval in seconds
    pub tcp_keepalive_interval_secs: u64,
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime mode: "single_threaded" or "multi_threaded"
    pub mode: String,

    /// Number of worker threads for multi-threaded mode (None = auto-detect CPU cores)
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
            log_level: "info".to_string(),
            access_log: AccessLogConfig::default(),
            logging: LoggingConfig::default(),
            ui: UiConfig::default(),
            http_client: HttpClientConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 50,
            idle_timeout_secs: 90,
            connect_timeout_secs: 10,
            tcp_keepalive: true,
            tcp_keepalive_interval_secs: 30,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: "multi_threaded".to_string(),
            worker_threads: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load configuration with environment variable overrides.
    ///
    /// An explicit path must exist. Without one, `config.yml` in the working
    /// directory is used when present, otherwise the defaults.
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_yaml_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment variables.
    ///
    /// Takes a lookup function so the overrides can be exercised without
    /// touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_file) = lookup("LOG_FILE").filter(|v| !v.is_empty()) {
            self.access_log.log_file = Some(PathBuf::from(log_file));
        }

        if let Some(api_url) = lookup("OPENAISERVER_URL").filter(|v| !v.is_empty()) {
            self.ui.api_url = api_url;
        }

        if let Some(addr) = lookup("LISTEN_ADDR").and_then(|v| v.parse().ok()) {
            self.listen_addr = addr;
        }

        if let Some(log_level) = lookup("RUST_LOG").filter(|v| !v.is_empty()) {
            self.log_level = log_level;
        }

        if let Some(trust) = lookup("ACCESS_LOG_TRUST_FORWARDED_FOR") {
            self.access_log.trust_forwarded_for = trust.to_lowercase() == "true";
        }

        if let Some(mode) = lookup("SERVER_RUNTIME_MODE") {
            self.runtime.mode = mode;
        }

        if let Some(threads) = lookup("SERVER_WORKER_THREADS").and_then(|v| v.parse().ok()) {
            self.runtime.worker_threads = Some(threads);
        }
    }

    /// Parse and validate the backend URL
    pub fn api_url(&self) -> Result<Url> {
        let url = Url::parse(&self.ui.api_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "Unsupported backend URL scheme '{}' in {}",
                other, self.ui.api_url
            ))),
        }
    }
}
