//! # Node Client Port
//!
//! The partition node as seen by the indexer: a source of certified blocks
//! and a sink for submitted transaction orders. The sync loop and the REST
//! service both take an implementation of this trait at construction.

use async_trait::async_trait;
use thiserror::Error;

use crate::transaction::{Block, TransactionOrder};

/// A batch of blocks returned by `get_blocks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBatch {
    /// Highest round covered by the batch. Rounds up to it that have no
    /// block in `blocks` are empty; a value below the requested start
    /// means the node has nothing new.
    pub max_round_number: u64,
    /// Blocks in increasing round order. Empty rounds are omitted.
    pub blocks: Vec<Block>,
}

/// Errors reported by the node client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeClientError {
    /// Node unreachable or returned a transport-level failure.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// Node refused the request (e.g. invalid transaction).
    #[error("rejected by node: {0}")]
    Rejected(String),

    /// Response could not be decoded.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),
}

/// Outbound port to the partition node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Latest certified round number.
    async fn get_round_number(&self) -> Result<u64, NodeClientError>;

    /// Block at `round`, `None` if the round is empty or not yet certified.
    async fn get_block(&self, round: u64) -> Result<Option<Block>, NodeClientError>;

    /// Up to `count` blocks starting at `from_round`.
    async fn get_blocks(&self, from_round: u64, count: u64) -> Result<BlockBatch, NodeClientError>;

    /// Forward a transaction order to the node.
    async fn submit_transaction(&self, order: &TransactionOrder) -> Result<(), NodeClientError>;
}
