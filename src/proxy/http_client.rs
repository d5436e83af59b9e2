//! Backend HTTP client
//!
//! One pooled client per process, shared by every proxied request. Both
//! `http://` and `https://` backends are supported.

use crate::config::HttpClientConfig;
use hyper::client::{HttpConnector, ResponseFuture};
use hyper::{Body, Client, Request};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use std::time::Duration;
use tracing::info;

/// Configuration for the pooled backend client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum idle connections per host (default: 50)
    pub max_idle_per_host: usize,
    /// How long to keep idle connections alive (default: 90 seconds)
    pub idle_timeout: Duration,
    /// Timeout for establishing new connections (default: 10 seconds)
    pub connect_timeout: Duration,
    /// TCP keepalive interval, disabled when `None`
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_config(&HttpClientConfig::default())
    }
}

impl ClientConfig {
    pub fn from_config(config: &HttpClientConfig) -> Self {
        Self {
            max_idle_per_host: config.max_idle_per_host,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            tcp_keepalive: config
                .tcp_keepalive
                .then(|| Duration::from_secs(config.tcp_keepalive_interval_secs)),
        }
    }
}

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct BackendClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    config: ClientConfig,
}

impl BackendClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn from_config(config: &HttpClientConfig) -> Self {
        Self::with_config(ClientConfig::from_config(config))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(Some(config.connect_timeout));
        http_connector.set_nodelay(true); // SSE chunks are small
        http_connector.set_keepalive(config.tcp_keepalive);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder()
            .pool_idle_timeout(config.idle_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build(connector);

        info!(
            "Backend client ready (max idle per host: {}, connect timeout: {:?})",
            config.max_idle_per_host, config.connect_timeout
        );

        Self { client, config }
    }

    /// Send a request to the backend
    pub fn request(&self, req: Request<Body>) -> ResponseFuture {
        self.client.request(req)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new()
    }
}
