//! mockdeck: configurable mock HTTP endpoints with a live request feed.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────────┐
//!                      │                      MOCKDECK                        │
//!                      │                                                      │
//!   Front end          │  ┌──────────┐     ┌──────────────┐                   │
//!   ───────────────────┼─▶│  http    │────▶│   control    │──▶ project store  │
//!   /api/*             │  │ (control │     │    plane     │                   │
//!                      │  │ surface) │     └──────┬───────┘                   │
//!                      │  └────┬─────┘            │ start/stop               │
//!                      │       │ /ws              ▼                          │
//!                      │       │          ┌──────────────┐                    │
//!   Client under test  │       │          │ net listener │                    │
//!   ───────────────────┼───────┼─────────▶│  + routing   │──▶ recorder        │
//!                      │       │          └──────────────┘        │           │
//!                      │       ▼                                  ▼           │
//!   Observers  ◀───────┼── broadcast hub ◀──────── status / new_request       │
//!                      └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use mockdeck::config::{load_config, AppConfig};
use mockdeck::lifecycle::{bootstrap, signals::shutdown_signal};
use mockdeck::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "mockdeck")]
#[command(about = "Mock HTTP endpoint server with a live request feed", long_about = None)]
struct Args {
    /// Application config file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control surface bind address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Projects root directory, overriding the config file.
    #[arg(short, long)]
    projects_root: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.control.bind_address = bind;
    }
    if let Some(root) = args.projects_root {
        config.projects.root = root;
    }

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mockdeck starting");
    tracing::info!(
        bind_address = %config.control.bind_address,
        projects_root = %config.projects.root,
        default_project = %config.projects.default_project,
        "Configuration loaded"
    );

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

    let boot = bootstrap(&config).await?;
    let plane = boot.plane.clone();

    boot.server.run(boot.listener, shutdown_signal()).await?;

    plane.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
