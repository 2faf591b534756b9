use anyhow::{ Context, Result };
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

use pdc_flag::automation::DesktopSink;
use pdc_flag::config::{ self, ConfigWatcher, PdcConfig };
use pdc_flag::network::BridgeServer;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdc_flag=debug,pdc_bridge=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PDC bridge");

    // Create Tokio runtime for the accept loop and the config watcher
    let runtime = Runtime::new()?;

    // Load initial configuration
    let config_path = config::config_path();
    let config = config::load_config(&config_path)?;
    tracing::info!("Configuration loaded from {}", config_path.display());

    let shared = Arc::new(RwLock::new(config));

    runtime.block_on(run_bridge(config_path, shared))
}

async fn run_bridge(config_path: PathBuf, shared: Arc<RwLock<PdcConfig>>) -> Result<()> {
    // Claim the channel before anything else so a second bridge exits early
    let server = BridgeServer::bind(shared.clone(), DesktopSink::new())
        .context("Failed to open bridge channel (is another pdc-bridge running?)")?;

    tracing::info!("Keep the ATC client focused when you click the PDC flag");

    // Start config file watcher
    let config_watcher = ConfigWatcher::new(config_path, shared);
    tokio::spawn(async move {
        if let Err(e) = config_watcher.watch().await {
            tracing::error!("Config watcher error: {}", e);
        }
    });

    server.run().await;
    Ok(())
}
