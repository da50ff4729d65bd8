use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{apply_batch, scan_map, OrderedMap};
use crate::adapters::lock::DataDirLock;
use crate::domain::errors::{KVStoreError, StoreError};
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

const DATA_FILE: &str = "bills.db";
const MAGIC: &[u8; 4] = b"WBKV";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 4;

/// File-backed key-value store.
///
/// The whole map is persisted as one snapshot on every batch:
/// `[magic][version][crc32(body)][body]` with body entries encoded as
/// `[key_len:u32][key][value_len:u32][value]`. The snapshot is written to a
/// temp file, fsync'd and renamed over the previous one, so a crash leaves
/// either the old or the new state on disk. The data directory is locked for
/// the lifetime of the store.
pub struct FileBackedKVStore {
    data: OrderedMap,
    path: PathBuf,
    _lock: DataDirLock,
}

impl FileBackedKVStore {
    /// Open (or create) the store in `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(KVStoreError::io)?;
        let lock = DataDirLock::acquire(data_dir)?;

        let path = data_dir.join(DATA_FILE);
        let data = if path.exists() {
            let bytes = fs::read(&path).map_err(KVStoreError::io)?;
            let data = decode_snapshot(&bytes)?;
            tracing::info!(
                "[wb-01] Loaded {} keys from {} ({} bytes)",
                data.len(),
                path.display(),
                bytes.len()
            );
            data
        } else {
            tracing::info!("[wb-01] No existing storage file at {}", path.display());
            OrderedMap::new()
        };

        Ok(Self {
            data,
            path,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self, data: &OrderedMap) -> Result<(), KVStoreError> {
        let bytes = encode_snapshot(data);

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(KVStoreError::io)?;
        file.write_all(&bytes).map_err(KVStoreError::io)?;
        file.sync_all().map_err(KVStoreError::io)?;
        fs::rename(&temp_path, &self.path).map_err(KVStoreError::io)?;

        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    /// The next map, already on disk.
    type Prepared = OrderedMap;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn prepare_batch(&self, operations: Vec<BatchOperation>) -> Result<Self::Prepared, KVStoreError> {
        let mut next = self.data.clone();
        apply_batch(&mut next, operations);
        self.save_to_file(&next)?;
        Ok(next)
    }

    fn apply_prepared(&mut self, prepared: Self::Prepared) {
        self.data = prepared;
    }

    fn scan(&self, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> Result<ScanResult, KVStoreError> {
        Ok(scan_map(&self.data, prefix, start, limit))
    }
}

fn encode_snapshot(data: &OrderedMap) -> Vec<u8> {
    let mut body = Vec::new();
    for (key, value) in data {
        body.extend_from_slice(&(key.len() as u32).to_le_bytes());
        body.extend_from_slice(key);
        body.extend_from_slice(&(value.len() as u32).to_le_bytes());
        body.extend_from_slice(value);
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    bytes.extend_from_slice(&body);
    bytes
}

fn decode_snapshot(bytes: &[u8]) -> Result<OrderedMap, KVStoreError> {
    let corrupt = |message: &str| KVStoreError::CorruptionError {
        message: message.to_string(),
    };

    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(corrupt("missing snapshot header"));
    }
    if bytes[MAGIC.len()] != FORMAT_VERSION {
        return Err(corrupt("unsupported snapshot version"));
    }
    let expected = read_u32(bytes, MAGIC.len() + 1).ok_or_else(|| corrupt("truncated header"))?;
    let body = &bytes[HEADER_LEN..];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(KVStoreError::CorruptionError {
            message: format!("checksum mismatch: expected {:08x}, got {:08x}", expected, actual),
        });
    }

    let mut data = OrderedMap::new();
    let mut cursor = 0;
    while cursor < body.len() {
        let key = read_chunk(body, &mut cursor).ok_or_else(|| corrupt("truncated key"))?;
        let value = read_chunk(body, &mut cursor).ok_or_else(|| corrupt("truncated value"))?;
        data.insert(key, value);
    }
    Ok(data)
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes(raw.try_into().ok()?))
}

fn read_chunk(body: &[u8], cursor: &mut usize) -> Option<Vec<u8>> {
    let len = read_u32(body, *cursor)? as usize;
    let start = *cursor + 4;
    let chunk = body.get(start..start + len)?.to_vec();
    *cursor = start + len;
    Some(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(key: &[u8], value: &[u8]) -> BatchOperation {
        BatchOperation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileBackedKVStore::open(dir.path()).unwrap();
            store
                .atomic_batch_write(vec![put(b"unit:1", b"one"), put(b"unit:2", b"two")])
                .unwrap();
            store
                .atomic_batch_write(vec![BatchOperation::Delete {
                    key: b"unit:1".to_vec(),
                }])
                .unwrap();
        }

        let store = FileBackedKVStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"unit:1").unwrap(), None);
        assert_eq!(store.get(b"unit:2").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let _first = FileBackedKVStore::open(dir.path()).unwrap();
        let second = FileBackedKVStore::open(dir.path());
        assert!(matches!(second, Err(StoreError::Lock(_))));
    }

    #[test]
    fn test_prepared_batch_is_on_disk_before_it_is_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBackedKVStore::open(dir.path()).unwrap();

        let prepared = store.prepare_batch(vec![put(b"unit:1", b"one")]).unwrap();
        assert_eq!(store.get(b"unit:1").unwrap(), None);
        let on_disk = decode_snapshot(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk.get(b"unit:1".as_slice()), Some(&b"one".to_vec()));

        store.apply_prepared(prepared);
        assert_eq!(store.get(b"unit:1").unwrap(), Some(b"one".to_vec()));
    }

    #[test]
    fn test_corrupted_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileBackedKVStore::open(dir.path()).unwrap();
            store
                .atomic_batch_write(vec![put(b"meta:block_number", &7u64.to_be_bytes())])
                .unwrap();
        }

        let path = dir.path().join(DATA_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        let result = FileBackedKVStore::open(dir.path());
        assert!(matches!(
            result,
            Err(StoreError::KeyValue(KVStoreError::CorruptionError { .. }))
        ));
    }

    #[test]
    fn test_snapshot_roundtrip_empty_values() {
        let mut data = OrderedMap::new();
        data.insert(b"owner:x".to_vec(), Vec::new());
        data.insert(b"unit:x".to_vec(), vec![1, 2, 3]);
        assert_eq!(decode_snapshot(&encode_snapshot(&data)).unwrap(), data);
    }
}
