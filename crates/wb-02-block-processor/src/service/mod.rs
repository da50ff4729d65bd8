//! # Block Processor Service
//!
//! Applies one certified block per store transaction. Either every
//! projection of the block and the new round number are committed, or
//! nothing is.

mod handlers;

use std::sync::Arc;

use shared_types::{Block, Proof, TxProof};
use tracing::{debug, info};
use wb_01_bill_store::{BillStore, BillStoreRead};

use crate::domain::{BlockSummary, ProcessingError, ProcessorConfig, ProcessorMetrics};
use crate::ports::BlockProcessorApi;
use handlers::{apply_transaction, TxInput};

/// The block processor.
pub struct BlockProcessor<S: BillStore> {
    store: Arc<S>,
    config: ProcessorConfig,
    metrics: Arc<ProcessorMetrics>,
}

impl<S: BillStore> BlockProcessor<S> {
    pub fn new(store: Arc<S>, config: ProcessorConfig) -> Self {
        Self {
            store,
            config,
            metrics: Arc::new(ProcessorMetrics::new()),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Shared handle to the processor counters.
    pub fn metrics(&self) -> Arc<ProcessorMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl<S: BillStore> BlockProcessorApi for BlockProcessor<S> {
    fn process_block(&self, block: &Block) -> Result<BlockSummary, ProcessingError> {
        if block.system_identifier != self.config.system_id {
            return Err(ProcessingError::SystemIdMismatch {
                expected: self.config.system_id,
                actual: block.system_identifier,
            });
        }

        let tree = block.tx_tree()?;
        let tx_root = tree.root();
        let block_hash = block.hash_with_root(&tx_root);
        let round = block.round_number;

        let summary = self.store.with_transaction(|tx| {
            let stored = tx.get_block_number()?;
            if round <= stored {
                return Err(ProcessingError::NonMonotonicRound {
                    stored,
                    received: round,
                });
            }

            let sdrs = tx.get_system_description_records()?;
            let mut summary = BlockSummary {
                round_number: round,
                transactions: block.transactions.len() as u64,
                ..BlockSummary::default()
            };

            for (index, record) in block.transactions.iter().enumerate() {
                let input = TxInput {
                    config: &self.config,
                    sdrs: &sdrs,
                    round,
                    record,
                    tx_hash: record.transaction_order.hash()?,
                    proof: Proof {
                        tx_record: record.clone(),
                        tx_proof: TxProof {
                            block_number: round,
                            tx_index: index as u32,
                            block_hash,
                            tx_root,
                            chain: tree.chain(index).unwrap_or_default(),
                        },
                    },
                };
                apply_transaction(tx, &input, &mut summary)?;
            }

            summary.expired_bills_removed = tx.delete_expired_bills(round)? as u64;
            tx.set_block_number(round)?;
            Ok(summary)
        })?;

        self.metrics.record_block(&summary);
        if summary.expired_bills_removed > 0 {
            debug!(
                "[wb-02] Removed {} expired dust bills at round {}",
                summary.expired_bills_removed, round
            );
        }
        info!(
            "[wb-02] Indexed block {} ({} txs, {} skipped)",
            round, summary.transactions, summary.skipped_transactions
        );
        Ok(summary)
    }

    fn last_indexed_round(&self) -> Result<u64, ProcessingError> {
        Ok(self.store.get_block_number()?)
    }
}
