//! Stand-alone SOAP quote backend for running the gateway locally.
//!
//! ```text
//! mock-quote-backend --bind 127.0.0.1:3000
//! ```

use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use quote_gateway::config::{DownstreamConfig, ObservabilityConfig};
use quote_gateway::http::mock_backend;
use quote_gateway::lifecycle::wait_for_signal;
use quote_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "mock-quote-backend")]
#[command(about = "Fake SOAP quote service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Path the quote call is served on.
    #[arg(short, long)]
    path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&ObservabilityConfig::default());

    let cli = Cli::parse();
    let path = cli.path.unwrap_or_else(|| DownstreamConfig::default().path);

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, path = %path, "Mock quote backend listening");

    let app = mock_backend::router(&path).layer(TraceLayer::new_for_http());
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    Ok(())
}
