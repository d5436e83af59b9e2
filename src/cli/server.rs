//! Server management CLI commands

use crate::config::ServerConfig;
use crate::handlers::{Handler, HelloHandler, UiRouter};
use crate::logging::AccessLogWriter;
use crate::middleware::AccessLog;
use crate::models::RecordOptions;
use crate::proxy::{BackendClient, ReverseProxy};
use crate::server::HttpServer;
use crate::log_info;
use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default address of the chat UI server
pub const DEFAULT_UI_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Default, Args)]
pub struct HelloArgs {
    /// Listening address (default 0.0.0.0:8888)
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Append access-log lines to this file instead of stdout
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct UiArgs {
    /// Listening address (default 0.0.0.0:8080)
    #[arg(long, conflicts_with = "ui_port")]
    pub listen_addr: Option<String>,

    /// Port to serve the UI on, all interfaces
    #[arg(long)]
    pub ui_port: Option<u16>,

    /// Backend the API calls are relayed to
    #[arg(long, env = "OPENAISERVER_URL")]
    pub api_url: Option<String>,

    /// Append access-log lines to this file instead of stdout
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,
}

fn parse_listen_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse()
        .with_context(|| format!("Invalid listen address '{}'", addr))
}

fn options(config: &ServerConfig) -> RecordOptions {
    RecordOptions {
        trust_forwarded_for: config.access_log.trust_forwarded_for,
        include_query: config.access_log.include_query,
    }
}

impl HelloArgs {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn to_config(&self, mut config: ServerConfig) -> Result<ServerConfig> {
        if let Some(addr) = &self.listen_addr {
            config.listen_addr = parse_listen_addr(addr)?;
        }
        if let Some(log_file) = self.log_file.as_deref().filter(|f| !f.is_empty()) {
            config.access_log.log_file = Some(log_file.into());
        }
        Ok(config)
    }

    /// Start the hello server and run until Ctrl-C
    pub async fn start_server(&self, config: ServerConfig) -> Result<()> {
        let config = self.to_config(config)?;
        let writer = AccessLogWriter::from_config(config.access_log.log_file.as_ref())
            .context("Cannot open access log")?;

        info!("Server Configuration:");
        info!("   Listen: {}", config.listen_addr);
        info!("   Access log: {}", writer.destination());

        let handler = AccessLog::with_options(HelloHandler, writer, options(&config));
        serve(config.listen_addr, Arc::new(handler)).await
    }
}

impl UiArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// The UI listens on 0.0.0.0:8080 unless an address was configured
    /// explicitly.
    pub fn to_config(&self, mut config: ServerConfig) -> Result<ServerConfig> {
        if config.listen_addr == ServerConfig::default().listen_addr {
            config.listen_addr = parse_listen_addr(DEFAULT_UI_LISTEN_ADDR)?;
        }
        if let Some(addr) = &self.listen_addr {
            config.listen_addr = parse_listen_addr(addr)?;
        }
        if let Some(port) = self.ui_port {
            config.listen_addr = SocketAddr::from(([0, 0, 0, 0], port));
        }
        if let Some(api_url) = self.api_url.as_deref().filter(|u| !u.is_empty()) {
            config.ui.api_url = api_url.to_string();
        }
        if let Some(log_file) = self.log_file.as_deref().filter(|f| !f.is_empty()) {
            config.access_log.log_file = Some(log_file.into());
        }
        Ok(config)
    }

    /// Start the chat UI server and run until Ctrl-C
    pub async fn start_server(&self, config: ServerConfig) -> Result<()> {
        let config = self.to_config(config)?;
        let api_url = config
            .api_url()
            .with_context(|| format!("Failed to parse API URL '{}'", config.ui.api_url))?;
        let writer = AccessLogWriter::from_config(config.access_log.log_file.as_ref())
            .context("Cannot open access log")?;

        info!("Server Configuration:");
        info!("   Listen: {}", config.listen_addr);
        info!("   Backend: {}", api_url);
        info!("   Access log: {}", writer.destination());

        let proxy = ReverseProxy::new(api_url.clone(), BackendClient::from_config(&config.http_client));
        let router = UiRouter::new(&api_url, proxy);
        let handler = AccessLog::with_options(router, writer, options(&config));

        log_info!("Serving UI on http://localhost:{}", config.listen_addr.port());
        log_info!("Proxying API requests to {}", api_url);
        serve(config.listen_addr, Arc::new(handler)).await
    }
}

async fn serve(addr: SocketAddr, handler: Arc<dyn Handler>) -> Result<()> {
    let server = HttpServer::bind(addr).with_context(|| format!("Failed to bind {}", addr))?;
    debug!("Bound {}", server.local_addr());

    server
        .serve_with_shutdown(handler, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_hello_defaults() {
        let config = HelloArgs::default().to_config(ServerConfig::default()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8888".parse().unwrap());
        assert!(config.access_log.log_file.is_none());
    }

    #[test]
    fn test_ui_defaults_to_8080() {
        let config = UiArgs::default().to_config(ServerConfig::default()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.ui.api_url, "http://localhost:4000");
    }

    #[test]
    fn test_ui_flags_win() {
        let args = UiArgs {
            ui_port: Some(9090),
            api_url: Some("https://models.internal:8443".to_string()),
            log_file: Some("/tmp/ui-access.log".to_string()),
            ..Default::default()
        };
        let mut base = ServerConfig::default();
        base.ui.api_url = "http://from-config:4000".to_string();

        let config = args.to_config(base).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9090".parse().unwrap());
        assert_eq!(config.ui.api_url, "https://models.internal:8443");
        assert_eq!(config.access_log.log_file, Some(PathBuf::from("/tmp/ui-access.log")));
    }

    #[test]
    fn test_configured_address_kept_for_ui() {
        let mut base = ServerConfig::default();
        base.listen_addr = "127.0.0.1:7000".parse().unwrap();
        let config = UiArgs::default().to_config(base).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:7000".parse().unwrap());
    }

    #[test]
    fn test_bad_listen_addr_rejected() {
        let args = HelloArgs {
            listen_addr: Some("not-an-address".to_string()),
            ..Default::default()
        };
        assert!(args.to_config(ServerConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_bad_api_url_is_fatal() {
        let args = UiArgs {
            listen_addr: Some("127.0.0.1:0".to_string()),
            api_url: Some("::not a url::".to_string()),
            ..Default::default()
        };
        let err = args.start_server(ServerConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse API URL"));
    }
}
