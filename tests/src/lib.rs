//! # Wallet Backend Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Keys, orders, records, blocks
//! ├── parity.rs          # Same assertions against every store backend
//! └── integration/       # Cross-crate flows
//!     ├── indexing.rs    # Processor + store scenarios
//!     └── backend.rs     # Full backend over HTTP with a mock node
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wb-tests
//! cargo test -p wb-tests parity::
//! cargo test -p wb-tests integration::
//! ```

#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod integration;
#[cfg(test)]
pub mod parity;
