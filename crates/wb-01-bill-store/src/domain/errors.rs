//! # Domain Errors
//!
//! Error types for the bill store.

use thiserror::Error;

use crate::adapters::lock::LockError;

/// Errors from the raw key-value layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Persisted state failed its integrity check.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl KVStoreError {
    pub(crate) fn io(err: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by the bill store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing medium failed.
    #[error(transparent)]
    KeyValue(#[from] KVStoreError),

    /// Data directory is locked by another process.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// A secondary index entry points at a missing record.
    #[error("index corruption: {message}")]
    IndexCorruption { message: String },
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}
