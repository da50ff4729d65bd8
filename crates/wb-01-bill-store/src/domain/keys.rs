//! # Key Layout
//!
//! All buckets share one ordered key space and are separated by prefix.
//! Multi-byte integers inside keys are big-endian so that lexicographic
//! order equals numeric order.
//!
//! | Prefix | Key suffix | Value |
//! |---|---|---|
//! | `unit:` | unit id | `Bill` |
//! | `owner:` | sha256(predicate) ‖ unit id | empty |
//! | `fcb:` | unit id | `FeeCreditBill` |
//! | `meta:` | name | u64 be |
//! | `expire:` | height ‖ unit id | empty |
//! | `proof:` | unit id ‖ tx hash | `Proof` |
//! | `sdr:` | system id | `SystemDescriptionRecord` |
//! | `lockedfc:` | system id ‖ fee credit id | `TransactionRecord` |
//! | `closedfc:` | fee credit id | `TransactionRecord` |
//! | `txh:` | sha256(predicate) ‖ !seq | `TxHistoryRecord` |
//! | `txi:` | sha256(predicate) ‖ tx hash ‖ kind | seq |

use shared_types::{sha256, Hash, SystemId, TxHistoryKind, UnitId};

/// Key prefixes for the different buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    Unit,
    Owner,
    FeeCreditBill,
    Meta,
    Expiration,
    Proof,
    SystemDescription,
    LockedFeeCredit,
    ClosedFeeCredit,
    TxHistory,
    TxHistoryIndex,
}

impl KeyPrefix {
    /// Get the byte prefix for this bucket.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Unit => b"unit:",
            KeyPrefix::Owner => b"owner:",
            KeyPrefix::FeeCreditBill => b"fcb:",
            KeyPrefix::Meta => b"meta:",
            KeyPrefix::Expiration => b"expire:",
            KeyPrefix::Proof => b"proof:",
            KeyPrefix::SystemDescription => b"sdr:",
            KeyPrefix::LockedFeeCredit => b"lockedfc:",
            KeyPrefix::ClosedFeeCredit => b"closedfc:",
            KeyPrefix::TxHistory => b"txh:",
            KeyPrefix::TxHistoryIndex => b"txi:",
        }
    }

    /// Build a full key from suffix parts.
    pub fn key(&self, parts: &[&[u8]]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        for part in parts {
            key.extend_from_slice(part);
        }
        key
    }

    pub fn unit_key(id: &UnitId) -> Vec<u8> {
        KeyPrefix::Unit.key(&[id])
    }

    /// Prefix of every owner-index entry of one predicate.
    pub fn owner_prefix(owner_predicate: &[u8]) -> Vec<u8> {
        KeyPrefix::Owner.key(&[&owner_hash(owner_predicate)])
    }

    pub fn owner_key(owner_predicate: &[u8], id: &UnitId) -> Vec<u8> {
        KeyPrefix::Owner.key(&[&owner_hash(owner_predicate), id])
    }

    pub fn fee_credit_bill_key(id: &UnitId) -> Vec<u8> {
        KeyPrefix::FeeCreditBill.key(&[id])
    }

    pub fn block_number_key() -> Vec<u8> {
        KeyPrefix::Meta.key(&[b"block_number"])
    }

    pub fn tx_history_seq_key() -> Vec<u8> {
        KeyPrefix::Meta.key(&[b"tx_history_seq"])
    }

    pub fn expiration_key(height: u64, id: &UnitId) -> Vec<u8> {
        KeyPrefix::Expiration.key(&[&height.to_be_bytes(), id])
    }

    /// Split an expiration key into its height and unit id.
    pub fn parse_expiration_key(key: &[u8]) -> Option<(u64, UnitId)> {
        let suffix = key.strip_prefix(KeyPrefix::Expiration.as_bytes())?;
        if suffix.len() != 8 + 32 {
            return None;
        }
        let height = u64::from_be_bytes(suffix[..8].try_into().ok()?);
        let id: UnitId = suffix[8..].try_into().ok()?;
        Some((height, id))
    }

    pub fn proof_key(id: &UnitId, tx_hash: &Hash) -> Vec<u8> {
        KeyPrefix::Proof.key(&[id, tx_hash])
    }

    pub fn system_description_key(system_id: &SystemId) -> Vec<u8> {
        KeyPrefix::SystemDescription.key(&[system_id])
    }

    pub fn locked_fee_credit_key(system_id: &SystemId, fcb_id: &UnitId) -> Vec<u8> {
        KeyPrefix::LockedFeeCredit.key(&[system_id, fcb_id])
    }

    pub fn closed_fee_credit_key(fcb_id: &UnitId) -> Vec<u8> {
        KeyPrefix::ClosedFeeCredit.key(&[fcb_id])
    }

    pub fn tx_history_prefix(owner_predicate: &[u8]) -> Vec<u8> {
        KeyPrefix::TxHistory.key(&[&owner_hash(owner_predicate)])
    }

    /// History keys sort newest first: the sequence number is inverted.
    pub fn tx_history_key(owner_predicate: &[u8], seq: u64) -> Vec<u8> {
        KeyPrefix::TxHistory.key(&[&owner_hash(owner_predicate), &(u64::MAX - seq).to_be_bytes()])
    }

    pub fn tx_history_index_key(owner_predicate: &[u8], tx_hash: &Hash, kind: TxHistoryKind) -> Vec<u8> {
        let kind_byte = match kind {
            TxHistoryKind::Incoming => 0u8,
            TxHistoryKind::Outgoing => 1u8,
        };
        KeyPrefix::TxHistoryIndex.key(&[&owner_hash(owner_predicate), tx_hash, &[kind_byte]])
    }
}

fn owner_hash(owner_predicate: &[u8]) -> Hash {
    sha256(&[owner_predicate])
}
