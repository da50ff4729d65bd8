//! # Outbound Ports (Driven Ports)
//!
//! The ordered byte-key storage a `KvBillStore` is layered on. Adapters only
//! need point reads, prefix scans and all-or-nothing batches; buckets,
//! encoding and indexes live above this line.
//!
//! A batch is committed in two steps. `prepare_batch` does the slow part
//! (building and persisting the next state) through a shared reference, so
//! readers keep going meanwhile. `apply_prepared` only swaps the prepared
//! state in and cannot fail.

use crate::domain::errors::KVStoreError;

/// `(key, value)` pairs in ascending key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Ordered key-value storage.
///
/// Implemented by `InMemoryKVStore` and `FileBackedKVStore`.
pub trait KeyValueStore: Send + Sync {
    /// A batch that is durable but not yet visible to readers.
    type Prepared: Send;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Entries under `prefix`, ascending, from `start` (inclusive) when it
    /// sorts after the prefix, at most `limit` of them.
    fn scan(&self, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> Result<ScanResult, KVStoreError>;

    /// Persist `operations` without changing what readers see.
    ///
    /// The caller must not prepare another batch before applying this one.
    fn prepare_batch(&self, operations: Vec<BatchOperation>) -> Result<Self::Prepared, KVStoreError>;

    /// Make a prepared batch visible.
    fn apply_prepared(&mut self, prepared: Self::Prepared);

    /// Apply `operations` in order. On error nothing is applied.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let prepared = self.prepare_batch(operations)?;
        self.apply_prepared(prepared);
        Ok(())
    }
}

/// One write of a committed store transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}
