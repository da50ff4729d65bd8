//! # Ports
//!
//! - `inbound`: the bill store contract used by the block processor and the REST service
//! - `outbound`: the raw key-value storage the store is built on

pub mod inbound;
pub mod outbound;

pub use inbound::{BillPage, BillStore, BillStoreRead, BillStoreTx, HistoryPage};
pub use outbound::{BatchOperation, KeyValueStore, ScanResult};
