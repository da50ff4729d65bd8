//! # Domain Layer

pub mod config;
pub mod errors;

pub use config::{Backoff, SyncConfig};
pub use errors::SyncError;
