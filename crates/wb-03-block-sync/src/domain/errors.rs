//! # Sync Errors

use shared_types::NodeClientError;
use thiserror::Error;
use wb_02_block_processor::ProcessingError;

/// Errors raised by the sync loop.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching blocks from the node failed.
    #[error("node error: {0}")]
    Node(#[from] NodeClientError),

    /// Applying a block failed.
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// The blocking processing task panicked or was cancelled.
    #[error("processing task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Whether the loop must stop instead of backing off and retrying.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Node(_) => false,
            SyncError::Processing(e) => e.is_fatal(),
            SyncError::Task(_) => true,
        }
    }
}
