//! quote-gateway
//!
//! Serves `GET /quote/<symbol>` by calling a legacy SOAP quote service and
//! answering with the plain-text price.
//!
//! ```text
//!   client ──GET /quote/ABC──▶ ┌────────────────────────────┐
//!                              │ trace · request id · timing │
//!                              │ catch-panic · session       │
//!                              │ RequestPipeline             │──POST envelope──▶ SOAP backend
//!   client ◀──"123.45\n"────── │   (TimedInvoker, recorder)  │◀──price envelope─
//!                              └────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use quote_gateway::config::{
    apply_env_overrides, load_config, validate_config, ConfigError, GatewayConfig,
};
use quote_gateway::http::HttpServer;
use quote_gateway::lifecycle::Shutdown;
use quote_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "quote-gateway")]
#[command(about = "HTTP to SOAP stock quote gateway", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!("quote-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        downstream = %config.downstream.address,
        maybe_timeout = config.simulation.maybe_timeout,
        maybe_cancel = config.simulation.maybe_cancel,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated above.
        let addr = config.observability.metrics_address.parse::<SocketAddr>()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
