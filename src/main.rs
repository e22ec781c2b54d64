//! Squawker DNS bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!   Evermore node                                                Authoritative DNS
//!   ┌──────────┐   height/blocks   ┌──────────────┐   UPDATE/TCP   ┌──────────────┐
//!   │ JSON-RPC │──────────────────▶│ ChainPoller  │───────────────▶│  <sender>.   │
//!   └──────────┘◀──────────────────│              │                │  evr.<zone>  │
//!        prior outputs (inputs)    │  Classifier  │                └──────────────┘
//!                                  │  Resolver ───┼──▶ IPFS (cat <reference>)
//!                                  │  Updater     │
//!                                  └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use squawker_dns::config::load_config;
use squawker_dns::lifecycle::{build_poller, check_ledger, signals, Shutdown};
use squawker_dns::ledger::RpcLedgerClient;
use squawker_dns::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "squawker-dns")]
#[command(about = "Publish Squawker protocol DNS records from the Evermore chain", long_about = None)]
struct Cli {
    /// TOML configuration file; environment overrides apply on top.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (overrides the config file).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate configuration, check ledger connectivity, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.observability.log_level.as_str());
    logging::init_logging(level);

    tracing::info!("squawker-dns v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.check {
        let ledger = RpcLedgerClient::new(config.ledger.clone())?;
        let reachable = check_ledger(&ledger).await;
        if !reachable {
            std::process::exit(1);
        }
        tracing::info!("Configuration OK");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let poller = build_poller(&config)?;

    let shutdown = Shutdown::new();
    let poller_shutdown = shutdown.subscribe();
    let watcher = tokio::spawn(poller.run(poller_shutdown));

    signals::wait_for_signal(&shutdown).await;
    watcher.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
