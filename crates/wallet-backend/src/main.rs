//! # Wallet Backend
//!
//! Entry point: logging, configuration, then the backend until Ctrl+C.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wallet_backend::container::BackendConfig;
use wallet_backend::WalletBackend;

fn load_config() -> Result<BackendConfig> {
    BackendConfig::from_env_vars(|name| std::env::var(name).ok())
        .context("invalid wallet-backend configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;
    info!("===========================================");
    info!("  Wallet Backend v{}", env!("CARGO_PKG_VERSION"));
    info!("  Node: {}", config.node.url);
    info!("  API:  http://{}", config.server.listen_addr);
    info!("===========================================");

    let backend = WalletBackend::new(config)?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut backend_task = tokio::spawn(backend.run(shutdown_rx));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown requested");
            shutdown_tx.send(true).ok();
            backend_task.await??;
        }
        result = &mut backend_task => {
            result??;
        }
    }

    info!("Wallet backend stopped");
    Ok(())
}
