//! # Block Sync (wb-03)
//!
//! The long-running loop that keeps the bill store in step with the
//! partition node: fetch a batch of rounds, apply each block through the
//! block processor, advance, poll again once caught up.
//!
//! ## Error Policy
//!
//! | Failure | Reaction |
//! |---|---|
//! | Node unavailable, bad response | exponential backoff, retry |
//! | Store failure while processing | exponential backoff, retry the block |
//! | Protocol violation (round, system id, fee underflow) | stop and return the error |
//!
//! ## Crate Structure
//!
//! - `domain/` - `SyncConfig`, `Backoff`, `SyncError`
//! - `service/` - `BlockSync`

pub mod domain;
pub mod service;

pub use domain::{Backoff, SyncConfig, SyncError};
pub use service::BlockSync;
