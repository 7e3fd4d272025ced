//! CORS forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                ┌────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ http server ──▶ routing ──▶ security    │
//!     /GET/https%3A%2F%2F... │   (request id,    (path →     (blacklist, │
//!                            │    trace, CORS)    target)     scheme)    │
//!                            │                                   │        │
//!                            │                                   ▼        │
//!     ◀──────────────────────┼── response relay ◀── forward (deadline) ◀─┼──── Target
//!     + CORS headers         │    (size cap)        (size cap, headers)  │
//!                            └────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use cors_proxy::config::load_config;
use cors_proxy::http::HttpServer;
use cors_proxy::lifecycle::Shutdown;
use cors_proxy::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "cors-proxy", version, about = "Relay browser requests and attach permissive CORS headers")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        max_body_bytes = config.limits.max_body_bytes,
        timeout_ms = config.timeouts.request_ms,
        "cors-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.socket_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
