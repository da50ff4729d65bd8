//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait over an ordered map.

mod file;
mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::ports::outbound::{BatchOperation, ScanResult};

type OrderedMap = BTreeMap<Vec<u8>, Vec<u8>>;

fn apply_batch(map: &mut OrderedMap, operations: Vec<BatchOperation>) {
    for op in operations {
        match op {
            BatchOperation::Put { key, value } => {
                map.insert(key, value);
            }
            BatchOperation::Delete { key } => {
                map.remove(&key);
            }
        }
    }
}

fn scan_map(map: &OrderedMap, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> ScanResult {
    let from = match start {
        Some(start) if start > prefix => start,
        _ => prefix,
    };
    map.range::<[u8], _>((Bound::Included(from), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(prefix))
        .take(limit)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
