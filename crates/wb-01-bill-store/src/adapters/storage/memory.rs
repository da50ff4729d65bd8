use super::{apply_batch, scan_map, OrderedMap};
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

/// Map-backed store for tests and throwaway indexers. Nothing survives the
/// process.
#[derive(Debug, Default)]
pub struct InMemoryKVStore {
    entries: OrderedMap,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    type Prepared = Vec<BatchOperation>;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn scan(&self, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> Result<ScanResult, KVStoreError> {
        Ok(scan_map(&self.entries, prefix, start, limit))
    }

    fn prepare_batch(&self, operations: Vec<BatchOperation>) -> Result<Self::Prepared, KVStoreError> {
        Ok(operations)
    }

    fn apply_prepared(&mut self, prepared: Self::Prepared) {
        apply_batch(&mut self.entries, prepared);
    }
}
