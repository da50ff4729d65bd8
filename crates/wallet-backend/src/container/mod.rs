//! # Container
//!
//! Configuration and the assembled component graph.

pub mod config;

pub use config::{
    BackendConfig, ChainConfig, ConfigError, NodeConfig, ServerConfig, StorageConfig, SyncSettings,
};
