//! # Transaction Proofs
//!
//! Binary SHA-256 Merkle tree over the record hashes of a block, and the
//! inclusion proofs the indexer stores next to every bill it writes.
//!
//! Leaves are padded to the next power of two (minimum two) with
//! `ZERO_HASH`, so the same transactions always produce the same root.

use serde::{Deserialize, Serialize};

use crate::encoding::sha256;
use crate::entities::{Hash, ZERO_HASH};
use crate::transaction::TransactionRecord;

/// A binary Merkle tree stored in array form: `[root, level1..., leaves...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    nodes: Vec<Hash>,
    leaf_count: usize,
    padded_leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree from leaf hashes.
    pub fn build(leaves: Vec<Hash>) -> Self {
        let leaf_count = leaves.len();
        if leaf_count == 0 {
            return Self {
                nodes: vec![ZERO_HASH],
                leaf_count: 0,
                padded_leaf_count: 0,
            };
        }

        let padded_leaf_count = leaf_count.next_power_of_two().max(2);
        let leaf_start = padded_leaf_count - 1;
        let mut nodes = vec![ZERO_HASH; 2 * padded_leaf_count - 1];
        nodes[leaf_start..leaf_start + leaf_count].copy_from_slice(&leaves);

        // Parent at index i has children at 2i+1 and 2i+2
        for i in (0..leaf_start).rev() {
            nodes[i] = hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }

        Self {
            nodes,
            leaf_count,
            padded_leaf_count,
        }
    }

    pub fn root(&self) -> Hash {
        self.nodes[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Sibling path from the leaf at `index` up to the root.
    pub fn chain(&self, index: usize) -> Option<Vec<ProofNode>> {
        if index >= self.leaf_count {
            return None;
        }

        let mut current = self.padded_leaf_count - 1 + index;
        let mut path = Vec::new();
        while current > 0 {
            // Odd indices are left children
            let (sibling, position) = if current % 2 == 0 {
                (current - 1, SiblingPosition::Left)
            } else {
                (current + 1, SiblingPosition::Right)
            };
            path.push(ProofNode {
                hash: self.nodes[sibling],
                position,
            });
            current = (current - 1) / 2;
        }
        Some(path)
    }
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    sha256(&[&left[..], &right[..]])
}

/// Position of a sibling relative to the node being proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiblingPosition {
    Left,
    Right,
}

/// A single step of a Merkle path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    pub hash: Hash,
    pub position: SiblingPosition,
}

/// Inclusion proof of a transaction record in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxProof {
    /// Round number of the block.
    pub block_number: u64,
    /// Position of the record in the block.
    pub tx_index: u32,
    pub block_hash: Hash,
    /// Merkle root over the block's record hashes.
    pub tx_root: Hash,
    /// Sibling path from the record hash to `tx_root`.
    pub chain: Vec<ProofNode>,
}

impl TxProof {
    /// Recompute the root from `leaf` and the chain and compare.
    pub fn verify(&self, leaf: &Hash) -> bool {
        let root = self.chain.iter().fold(*leaf, |acc, node| match node.position {
            SiblingPosition::Left => hash_pair(&node.hash, &acc),
            SiblingPosition::Right => hash_pair(&acc, &node.hash),
        });
        root == self.tx_root
    }
}

/// A transaction record with its inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub tx_record: TransactionRecord,
    pub tx_proof: TxProof,
}
