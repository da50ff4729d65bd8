//! # Error Types
//!
//! Decoding errors shared by every crate that parses ids, hex strings or
//! CBOR-encoded transaction data.

use thiserror::Error;

/// Errors raised while decoding external input (hex strings, CBOR payloads).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Hex string is missing the mandatory `0x` prefix.
    #[error("{name} must be a 0x-prefixed hex string")]
    MissingHexPrefix { name: &'static str },

    /// Hex string contains invalid characters or an odd number of digits.
    #[error("invalid {name} hex: {reason}")]
    InvalidHex { name: &'static str, reason: String },

    /// Decoded value has the wrong number of bytes.
    #[error("invalid {name} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// CBOR encoding or decoding failed.
    #[error("CBOR error: {0}")]
    Cbor(String),
}
