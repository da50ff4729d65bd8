//! # Adapters
//!
//! Outbound port implementations used by the binary.

pub mod node_client;

pub use node_client::RpcNodeClient;
