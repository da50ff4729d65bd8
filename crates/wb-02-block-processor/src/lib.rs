//! # Block Processor (wb-02)
//!
//! Projects certified blocks of the money partition onto the bill store.
//! Each block is applied inside one store transaction: bills are created,
//! moved, split, swapped and removed, fee credit is charged and settled,
//! proofs and history are filed, expired dust bills are dropped and the
//! indexed round advances.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |---|---|
//! | Block atomicity | every write happens inside `BillStore::with_transaction` |
//! | Monotonic rounds | a round not above the stored one is rejected |
//! | Fee bills never go negative | checked arithmetic, `BillUnderflow` |
//! | Unknown payload types never stop indexing | logged and counted as skipped |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - configuration, errors, metrics
//! - `ports/` - `BlockProcessorApi`
//! - `service/` - `BlockProcessor` and the per-type projection rules

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    BlockSummary, ProcessingError, ProcessorConfig, ProcessorMetrics,
    DEFAULT_DUST_BILL_DELETION_TIMEOUT,
};
pub use ports::BlockProcessorApi;
pub use service::BlockProcessor;
