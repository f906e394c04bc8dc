//! steemgate binary: CLI entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use steemgate::config::Config;
use steemgate::gateway;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "steemgate", version, about = "Authentication relay for Steem accounts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway.
    Serve {
        /// Bind host (overrides config).
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config).
        #[arg(long)]
        port: Option<u16>,
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("steemgate=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { host, port, config } => {
            let mut cfg = Config::load(config.as_deref())?;
            if let Some(host) = host {
                cfg.gateway.host = host;
            }
            if let Some(port) = port {
                cfg.gateway.port = port;
            }
            gateway::run_gateway(cfg).await
        }
    }
}
