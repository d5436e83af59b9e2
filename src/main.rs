//! Hello-world and chat UI servers with access logging

use access_log_proxy::{
    cli::{HelloArgs, UiArgs},
    init_logger_with_config, log_error, log_info,
    runtime::run_with_runtime,
    ServerConfig,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "access-log-proxy")]
#[command(about = "HTTP servers with access logging and a streaming chat UI proxy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// YAML configuration file (default: config.yml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve "Hello, World!" on every path
    #[command(name = "hello")]
    Hello(HelloArgs),

    /// Serve the chat UI and relay API calls to the backend
    #[command(name = "ui")]
    Ui(UiArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        cli.log_level.clone().unwrap_or_else(|| config.log_level.clone())
    };
    let _guard = init_logger_with_config(&log_level, config.logging.log_dir.as_deref());

    let runtime_config = config.runtime.clone();
    run_with_runtime(&runtime_config, async_main(cli, config))
}

async fn async_main(cli: Cli, config: ServerConfig) -> anyhow::Result<()> {
    log_info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(Commands::Ui(args)) => {
            log_info!("Starting chat UI server");
            args.start_server(config).await
        }
        Some(Commands::Hello(args)) => {
            log_info!("Starting hello server");
            args.start_server(config).await
        }
        None => {
            log_info!("Starting hello server (default command)");
            HelloArgs::default().start_server(config).await
        }
    };

    if let Err(e) = &result {
        log_error!("Server error: {:#}", e);
    }
    result
}
