//! # Domain Layer
//!
//! Key layout, genesis state and error types of the bill store.

pub mod errors;
pub mod genesis;
pub mod keys;

pub use errors::{KVStoreError, StoreError};
pub use genesis::GenesisState;
pub use keys::KeyPrefix;

/// Hard upper bound on page sizes returned by paginated reads.
pub const MAX_PAGE_LIMIT: usize = 100;
