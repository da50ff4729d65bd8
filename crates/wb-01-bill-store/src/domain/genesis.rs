//! # Genesis State
//!
//! What a fresh store is seeded with before the first block is indexed.

use shared_types::{Bill, SystemDescriptionRecord};

/// Initial contents of an empty store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenesisState {
    /// Partitions whose fee bills the indexer tracks.
    pub system_description_records: Vec<SystemDescriptionRecord>,
    /// The bill holding the initial money supply, if indexed.
    pub initial_bill: Option<Bill>,
}
