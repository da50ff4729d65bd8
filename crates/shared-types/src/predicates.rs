//! # Owner Predicates
//!
//! Pay-to-public-key-hash owner conditions. The indexer never evaluates
//! predicates; it only needs to build the exact bytes a wallet's bills are
//! filed under so `list-bills` and `balance` can look them up.

use crate::encoding::{decode_hex, sha256};
use crate::entities::{Hash, PUBKEY_LENGTH};
use crate::errors::DecodeError;

const OP_DUP: u8 = 0x76;
const OP_HASH: u8 = 0xa8;
const OP_PUSH_HASH: u8 = 0x4f;
const OP_EQUAL: u8 = 0x87;
const OP_VERIFY: u8 = 0x69;
const OP_CHECKSIG: u8 = 0xac;
const OP_PUSH_BOOL_PREFIX: u8 = 0x53;
const HASH_ALGO_SHA256: u8 = 0x01;
const SIG_SCHEME_SECP256K1: u8 = 0x01;

/// A validated compressed public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKey(Vec<u8>);

impl PubKey {
    /// Parse a `0x`-prefixed hex public key of exactly 33 bytes.
    pub fn from_hex(value: &str) -> Result<Self, DecodeError> {
        Self::from_bytes(decode_hex("pubkey", value)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.len() != PUBKEY_LENGTH {
            return Err(DecodeError::InvalidLength {
                name: "pubkey",
                expected: PUBKEY_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn hash(&self) -> Hash {
        sha256(&[self.0.as_slice()])
    }

    /// The P2PKH owner predicate of this key.
    pub fn owner_predicate(&self) -> Vec<u8> {
        p2pkh_predicate(&self.hash())
    }
}

/// P2PKH predicate bytes for a public key hash.
pub fn p2pkh_predicate(pubkey_hash: &Hash) -> Vec<u8> {
    let mut predicate = Vec::with_capacity(pubkey_hash.len() + 11);
    predicate.extend_from_slice(&[
        OP_PUSH_BOOL_PREFIX,
        OP_DUP,
        OP_HASH,
        HASH_ALGO_SHA256,
        OP_PUSH_HASH,
        HASH_ALGO_SHA256,
    ]);
    predicate.extend_from_slice(pubkey_hash);
    predicate.extend_from_slice(&[OP_EQUAL, OP_VERIFY, OP_CHECKSIG, SIG_SCHEME_SECP256K1]);
    predicate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_length_is_enforced() {
        let err = PubKey::from_hex("0x0102").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid pubkey length: expected 33 bytes, got 2"
        );
    }

    #[test]
    fn test_predicate_layout() {
        let key = PubKey::from_bytes(vec![2; 33]).unwrap();
        let predicate = key.owner_predicate();
        assert_eq!(predicate.len(), 43);
        assert_eq!(&predicate[..6], &[0x53, 0x76, 0xa8, 0x01, 0x4f, 0x01]);
        assert_eq!(&predicate[6..38], &key.hash()[..]);
        assert_eq!(&predicate[38..], &[0x87, 0x69, 0xac, 0x01]);
    }

    #[test]
    fn test_distinct_keys_distinct_predicates() {
        let a = PubKey::from_bytes(vec![2; 33]).unwrap();
        let b = PubKey::from_bytes(vec![3; 33]).unwrap();
        assert_ne!(a.owner_predicate(), b.owner_predicate());
    }
}
