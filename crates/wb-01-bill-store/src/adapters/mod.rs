//! # Adapters Module
//!
//! - `storage`: `KeyValueStore` implementations (in-memory, file-backed)
//! - `lock`: data directory locking (single writer process)

pub mod lock;
pub mod storage;

pub use lock::{DataDirLock, LockError};
pub use storage::{FileBackedKVStore, InMemoryKVStore};
