//! # Encoding Helpers
//!
//! `0x`-prefixed hex for the REST surface, CBOR for transaction bodies and
//! attributes, SHA-256 for every hash in the system.

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

use crate::entities::Hash;
use crate::errors::DecodeError;

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a `0x`-prefixed hex string of any length.
pub fn decode_hex(name: &'static str, value: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(DecodeError::MissingHexPrefix { name })?;
    hex::decode(digits).map_err(|e| DecodeError::InvalidHex {
        name,
        reason: e.to_string(),
    })
}

/// Decode a `0x`-prefixed hex string into exactly `N` bytes.
pub fn decode_hex_fixed<const N: usize>(
    name: &'static str,
    value: &str,
) -> Result<[u8; N], DecodeError> {
    let bytes = decode_hex(name, value)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| DecodeError::InvalidLength {
            name,
            expected: N,
            actual: bytes.len(),
        })
}

/// SHA-256 over the concatenation of `parts`.
pub fn sha256(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Serialize a value to CBOR.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, DecodeError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| DecodeError::Cbor(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value from CBOR.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    ciborium::from_reader(bytes).map_err(|e| DecodeError::Cbor(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_requires_prefix() {
        assert_eq!(
            decode_hex("unitId", "abcd"),
            Err(DecodeError::MissingHexPrefix { name: "unitId" })
        );
        assert_eq!(decode_hex("unitId", "0xabcd").unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn test_fixed_length_mismatch() {
        let err = decode_hex_fixed::<32>("unitId", "0x0102").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                name: "unitId",
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn test_invalid_hex_digits() {
        assert!(matches!(
            decode_hex("txHash", "0xzz"),
            Err(DecodeError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_encode_hex_has_prefix() {
        assert_eq!(encode_hex(&[0, 255]), "0x00ff");
    }

    #[test]
    fn test_sha256_concatenates_parts() {
        assert_eq!(sha256(&[&b"ab"[..], &b"c"[..]]), sha256(&[&b"abc"[..]]));
    }
}
