//! # Domain Layer

pub mod config;
pub mod errors;
pub mod metrics;

pub use config::{ProcessorConfig, DEFAULT_DUST_BILL_DELETION_TIMEOUT};
pub use errors::ProcessingError;
pub use metrics::{BlockSummary, ProcessorMetrics};
