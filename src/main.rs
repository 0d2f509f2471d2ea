//! Host-based reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                 VHOST PROXY                    │
//!                         │                                                │
//!   Client (http)  ───────┼─▶ ┌──────────┐                                 │
//!                         │   │  plain   │──┐                              │
//!                         │   │ listener │  │   ┌────────────┐             │
//!                         │   └──────────┘  ├──▶│ dispatcher │──▶ 404      │
//!   Client (https) ───────┼─▶ ┌──────────┐  │   │ (host map) │──▶ static   │
//!                         │   │   TLS    │──┘   └─────┬──────┘             │
//!                         │   │ listener │            │                    │
//!                         │   └──────────┘            ▼                    │
//!                         │                    ┌──────────────┐            │
//!                         │                    │ upstream     │────────────┼──▶ Upstream
//!                         │                    │ client       │◀───────────┼─── (502 on failure)
//!                         │                    └──────────────┘            │
//!                         │                                                │
//!                         │   config · logging · metrics · lifecycle       │
//!                         └────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use vhost_proxy::config::{load_config, DEFAULT_CONFIG_PATH};
use vhost_proxy::lifecycle::{self, shutdown_signal, AppContext, Shutdown};
use vhost_proxy::observability::{init_logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "vhost-proxy", version, about = "Host-based HTTP/HTTPS reverse proxy")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "VHOST_PROXY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("vhost-proxy: {err}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config.logging, config.environment)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        environment = %config.environment,
        http_port = config.proxy_config.http_port,
        https_port = ?config.proxy_config.https_port,
        "vhost-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let ctx = AppContext::build(config)?;
    let shutdown = Shutdown::new();
    let running = lifecycle::start(&ctx, shutdown.clone()).await?;

    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => shutdown.trigger(),
            Err(err) => tracing::error!(error = %err, "Cannot install signal handlers"),
        }
    });

    if let Err(err) = running.wait().await {
        tracing::error!(error = %err, "Proxy stopped with an error");
        return Err(err.into());
    }
    Ok(())
}
