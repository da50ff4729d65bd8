//! # Inbound Ports (Driving Ports)

use shared_types::Block;

use crate::domain::{BlockSummary, ProcessingError};

/// Applies certified blocks to the bill store, one block per transaction.
pub trait BlockProcessorApi: Send + Sync {
    /// Apply every transaction of `block` and advance the indexed round.
    ///
    /// On error nothing from the block is visible in the store.
    fn process_block(&self, block: &Block) -> Result<BlockSummary, ProcessingError>;

    /// Last round committed to the store.
    fn last_indexed_round(&self) -> Result<u64, ProcessingError>;
}
