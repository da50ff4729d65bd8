//! # Bill Store (wb-01)
//!
//! The transactional, secondarily-indexed store behind the wallet backend.
//! It holds bills, the owner → bill index, fee credit bills, the indexed
//! round number, the dust-bill expiration index, proofs and per-owner
//! transaction history.
//!
//! ## Invariants
//!
//! | Invariant | Enforced by |
//! |---|---|
//! | One block is one transaction | `BillStore::with_transaction` commits one batch or nothing |
//! | Every bill has exactly one owner-index entry | `set_bill` / `remove_bill` move the entry inside the same transaction |
//! | Readers never see half a commit | batches are persisted first, then swapped in under the write lock |
//! | Single writer process | `DataDirLock` on the data directory |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - key layout, genesis state, errors
//! - `ports/` - the store contract (inbound) and raw key-value storage (outbound)
//! - `adapters/` - in-memory and file-backed key-value stores, directory lock
//! - `service/` - `KvBillStore` and its transaction overlay
//!
//! ## Usage
//!
//! ```ignore
//! use wb_01_bill_store::{BillStore, BillStoreRead, InMemoryBillStore};
//!
//! let store = InMemoryBillStore::in_memory();
//! store.with_transaction(|tx| {
//!     tx.set_bill(&bill, None)?;
//!     tx.set_block_number(1)
//! })?;
//! let page = store.get_bills(&owner, None, 100)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{DataDirLock, FileBackedKVStore, InMemoryKVStore, LockError};
pub use domain::{GenesisState, KVStoreError, KeyPrefix, StoreError, MAX_PAGE_LIMIT};
pub use ports::{
    BatchOperation, BillPage, BillStore, BillStoreRead, BillStoreTx, HistoryPage, KeyValueStore,
    ScanResult,
};
pub use service::{FileBillStore, InMemoryBillStore, KvBillStore, StoreTx};
