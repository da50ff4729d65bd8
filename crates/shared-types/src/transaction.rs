//! # Blocks and Transactions
//!
//! Wire shapes of the blocks delivered by the partition node. Transaction
//! attributes stay as raw CBOR bytes here; `payloads` decodes them into the
//! closed set of payload variants the indexer understands.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::encoding::{sha256, to_cbor};
use crate::entities::{Hash, SystemId, UnitId};
use crate::errors::DecodeError;
use crate::proof::MerkleTree;

// =============================================================================
// BLOCK
// =============================================================================

/// A certified block of the money partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub system_identifier: SystemId,
    pub round_number: u64,
    pub previous_block_hash: Hash,
    pub transactions: Vec<TransactionRecord>,
}

impl Block {
    /// Merkle tree over the record hashes, in block order.
    pub fn tx_tree(&self) -> Result<MerkleTree, DecodeError> {
        let leaves = self
            .transactions
            .iter()
            .map(TransactionRecord::hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MerkleTree::build(leaves))
    }

    /// Block hash given the transaction root.
    pub fn hash_with_root(&self, tx_root: &Hash) -> Hash {
        sha256(&[
            &self.system_identifier[..],
            &self.round_number.to_be_bytes()[..],
            &self.previous_block_hash[..],
            &tx_root[..],
        ])
    }
}

// =============================================================================
// TRANSACTION RECORD
// =============================================================================

/// Execution metadata attached by the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// Fee actually charged for the transaction.
    pub actual_fee: u64,
}

/// A transaction order as it was executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_order: TransactionOrder,
    pub server_metadata: ServerMetadata,
}

impl TransactionRecord {
    pub fn new(transaction_order: TransactionOrder, actual_fee: u64) -> Self {
        Self {
            transaction_order,
            server_metadata: ServerMetadata { actual_fee },
        }
    }

    /// SHA-256 of the CBOR encoding of the record (Merkle leaf).
    pub fn hash(&self) -> Result<Hash, DecodeError> {
        let bytes = to_cbor(self)?;
        Ok(sha256(&[bytes.as_slice()]))
    }

    pub fn actual_fee(&self) -> u64 {
        self.server_metadata.actual_fee
    }
}

// =============================================================================
// TRANSACTION ORDER
// =============================================================================

/// Client-supplied limits and fee source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub timeout: u64,
    pub max_transaction_fee: u64,
    /// Fee credit record paying for this transaction.
    pub fee_credit_record_id: Option<UnitId>,
}

/// The signed part of a transaction order.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub system_id: SystemId,
    /// Payload type tag, e.g. `trans` or `split`.
    pub payload_type: String,
    pub unit_id: UnitId,
    /// CBOR-encoded, type-specific attributes.
    #[serde_as(as = "Bytes")]
    pub attributes: Vec<u8>,
    pub client_metadata: ClientMetadata,
}

/// A transaction order submitted by a wallet.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOrder {
    pub payload: Payload,
    #[serde_as(as = "Bytes")]
    pub owner_proof: Vec<u8>,
    #[serde_as(as = "Bytes")]
    pub fee_proof: Vec<u8>,
}

impl TransactionOrder {
    /// SHA-256 of the CBOR encoding of the order.
    pub fn hash(&self) -> Result<Hash, DecodeError> {
        let bytes = to_cbor(self)?;
        Ok(sha256(&[bytes.as_slice()]))
    }

    pub fn unit_id(&self) -> &UnitId {
        &self.payload.unit_id
    }

    pub fn payload_type(&self) -> &str {
        &self.payload.payload_type
    }

    pub fn system_id(&self) -> &SystemId {
        &self.payload.system_id
    }

    pub fn fee_credit_record_id(&self) -> Option<&UnitId> {
        self.payload.client_metadata.fee_credit_record_id.as_ref()
    }
}

/// Id of a unit created by `tx_hash` in the same shard as `unit_id`.
///
/// The first four bytes (the shard part) are kept; the rest comes from
/// SHA-256 over the source id and the transaction hash.
pub fn same_shard_id(unit_id: &UnitId, tx_hash: &Hash) -> UnitId {
    let digest = sha256(&[&unit_id[..], &tx_hash[..]]);
    let mut id = [0u8; 32];
    id[..4].copy_from_slice(&unit_id[..4]);
    id[4..].copy_from_slice(&digest[4..]);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(unit: u8) -> TransactionOrder {
        TransactionOrder {
            payload: Payload {
                system_id: [0, 0, 0, 0],
                payload_type: "trans".to_string(),
                unit_id: [unit; 32],
                attributes: vec![0xa0],
                client_metadata: ClientMetadata::default(),
            },
            owner_proof: vec![1],
            fee_proof: vec![],
        }
    }

    #[test]
    fn test_order_hash_is_deterministic() {
        assert_eq!(order(1).hash().unwrap(), order(1).hash().unwrap());
        assert_ne!(order(1).hash().unwrap(), order(2).hash().unwrap());
    }

    #[test]
    fn test_record_hash_covers_fee() {
        let a = TransactionRecord::new(order(1), 1);
        let b = TransactionRecord::new(order(1), 2);
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_same_shard_id_keeps_prefix() {
        let unit = [7u8; 32];
        let id = same_shard_id(&unit, &[1; 32]);
        assert_eq!(&id[..4], &unit[..4]);
        assert_ne!(id, unit);
        assert_eq!(id, same_shard_id(&unit, &[1; 32]));
        assert_ne!(id, same_shard_id(&unit, &[2; 32]));
    }

    #[test]
    fn test_order_cbor_roundtrip() {
        let bytes = to_cbor(&vec![order(3)]).unwrap();
        let decoded: Vec<TransactionOrder> = crate::encoding::from_cbor(&bytes).unwrap();
        assert_eq!(decoded, vec![order(3)]);
    }

    #[test]
    fn test_block_tree_covers_every_record() {
        let block = Block {
            system_identifier: [0; 4],
            round_number: 5,
            previous_block_hash: [0; 32],
            transactions: vec![TransactionRecord::new(order(1), 0), TransactionRecord::new(order(2), 0)],
        };
        let tree = block.tx_tree().unwrap();
        assert_eq!(tree.leaf_count(), 2);
        assert_ne!(block.hash_with_root(&tree.root()), [0; 32]);
    }
}
