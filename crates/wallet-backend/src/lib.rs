//! # Wallet Backend
//!
//! Indexes a money partition's certified blocks into a bill store and
//! serves the wallet REST API from it.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration tree loaded from `WB_*` variables
//! - `genesis/` - what an empty store is seeded with
//! - `adapters/` - node RPC client
//!
//! ## Startup Sequence
//!
//! 1. Load and validate configuration
//! 2. Open the bill store (file-backed unless `WB_IN_MEMORY=true`)
//! 3. Seed genesis state if the store is empty
//! 4. Spawn the block sync loop
//! 5. Serve the REST API until shutdown
//!
//! A protocol violation halts the sync loop but keeps the REST API up, so
//! wallets can still read the state indexed so far.

pub mod adapters;
pub mod container;
pub mod genesis;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use shared_types::NodeClient;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use wb_01_bill_store::{BillStoreRead, FileBillStore, InMemoryBillStore, KeyValueStore, KvBillStore};
use wb_02_block_processor::{BlockProcessor, ProcessorMetrics};
use wb_03_block_sync::BlockSync;
use wb_04_rest_api::RestService;

use crate::adapters::RpcNodeClient;
use crate::container::BackendConfig;
use crate::genesis::genesis_state;

/// The assembled backend.
pub struct WalletBackend {
    config: BackendConfig,
    client: Arc<dyn NodeClient>,
}

impl WalletBackend {
    /// Backend talking to the node at `config.node.url`.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = RpcNodeClient::new(config.node.url.clone(), config.node.request_timeout)
            .context("failed to create node client")?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Backend using a caller-supplied node client.
    pub fn with_client(config: BackendConfig, client: Arc<dyn NodeClient>) -> Self {
        Self { config, client }
    }

    /// Run until `shutdown` flips to `true`.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let listener = TcpListener::bind(self.config.server.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.server.listen_addr))?;
        self.run_on(listener, shutdown).await
    }

    /// Run with an already bound listener.
    pub async fn run_on(self, listener: TcpListener, shutdown: watch::Receiver<bool>) -> Result<()> {
        if self.config.storage.in_memory {
            info!("[wallet-backend] Using in-memory bill store");
            self.run_with_store(InMemoryBillStore::in_memory(), listener, shutdown)
                .await
        } else {
            let path = &self.config.storage.db_path;
            info!("[wallet-backend] Opening bill store at {}", path.display());
            let store = FileBillStore::open(path)
                .with_context(|| format!("failed to open bill store at {}", path.display()))?;
            self.run_with_store(store, listener, shutdown).await
        }
    }

    async fn run_with_store<KV: KeyValueStore + 'static>(
        self,
        store: KvBillStore<KV>,
        listener: TcpListener,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        if store
            .initialize(&genesis_state(&self.config.chain))
            .context("failed to seed genesis state")?
        {
            info!("[wallet-backend] Seeded empty store with genesis state");
        }
        let store = Arc::new(store);
        info!(
            "[wallet-backend] Indexed up to round {}",
            store.get_block_number()?
        );

        let processor = Arc::new(BlockProcessor::new(
            Arc::clone(&store),
            self.config.processor_config(),
        ));
        let metrics = processor.metrics();
        let sync = BlockSync::new(
            Arc::clone(&self.client),
            processor,
            self.config.sync_config(),
        );
        let rest = RestService::new(store, Arc::clone(&self.client), self.config.rest_config())?;

        let sync_shutdown = shutdown.clone();
        let sync_task = tokio::spawn(async move {
            if let Err(e) = sync.run(sync_shutdown).await {
                error!(
                    "[wallet-backend] Indexing halted, operator intervention required: {}",
                    e
                );
            }
        });

        rest.serve(listener, shutdown)
            .await
            .context("REST API failed")?;
        sync_task.await.context("block sync task panicked")?;

        log_metrics(&metrics);
        Ok(())
    }
}

fn log_metrics(metrics: &ProcessorMetrics) {
    info!(
        "[wallet-backend] Processed {} blocks, {} transactions ({} skipped, {} missing split sources, {} expired bills removed), last round {}",
        metrics.blocks_processed.load(Ordering::Relaxed),
        metrics.transactions_processed.load(Ordering::Relaxed),
        metrics.skipped_transactions.load(Ordering::Relaxed),
        metrics.missing_split_sources.load(Ordering::Relaxed),
        metrics.expired_bills_removed.load(Ordering::Relaxed),
        metrics.last_round_number.load(Ordering::Relaxed),
    );
}
