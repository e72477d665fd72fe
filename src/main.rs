//! Webhook transformation gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Caller                 ┌──────────────────────────────────────────────────┐
//!     ──── POST /hooks/{id} ─┼─▶ http::ingress ──▶ gateway::handler            │
//!                            │                       │                          │
//!                            │                       ▼                          │
//!                            │   store (catalog) ◀── gateway::flows             │
//!                            │                       │   template + transform   │
//!                            │                       ▼                          │
//!                            │                  gateway::dispatcher ────────────┼──▶ Targets
//!                            │                       │                          │
//!     ◀─── reply ────────────┼── http::reply ◀── response mapping / envelope    │
//!                            │                                                  │
//!                            │  config · observability · lifecycle              │
//!                            └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use webhook_gateway::config::{load_config, GatewayConfig};
use webhook_gateway::lifecycle::signals::spawn_signal_handler;
use webhook_gateway::observability::{logging, metrics};
use webhook_gateway::{Application, Shutdown};

#[derive(Parser)]
#[command(name = "webhook-gateway", version)]
#[command(about = "Template-driven webhook fan-out gateway", long_about = None)]
struct Cli {
    /// Gateway configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog file; overrides `store.path` from the configuration.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve webhooks (default)
    Serve,
    /// Load and validate the configuration and catalog, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(catalog) = &cli.catalog {
        config.store.path = Some(catalog.to_string_lossy().into_owned());
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "webhook-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        dispatch_timeout_secs = config.dispatch.timeout_secs,
        catalog = ?config.store.path,
        "Configuration loaded"
    );

    let app = Application::build(config.clone())?;
    if matches!(cli.command, Some(Commands::Check)) {
        tracing::info!(sources = app.store().snapshot().source_count(), "Configuration OK");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    app.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
