//! # Core Domain Entities
//!
//! The ownership projections maintained by the indexer.
//!
//! ## Clusters
//!
//! - **Identifiers**: `Hash`, `UnitId`, `SystemId`
//! - **Projections**: `Bill`, `FeeCreditBill`
//! - **Partition metadata**: `SystemDescriptionRecord`, `FeeCreditBillRef`
//! - **History**: `TxHistoryRecord`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Identifier of a unit (bill or fee credit record).
pub type UnitId = [u8; 32];

/// Identifier of a partition (system).
pub type SystemId = [u8; 4];

/// Length of a compressed secp256k1 public key.
pub const PUBKEY_LENGTH: usize = 33;

/// Hash with every byte zero (Merkle padding, "no previous block").
pub const ZERO_HASH: Hash = [0u8; 32];

/// System identifier of the money partition.
pub const MONEY_SYSTEM_ID: SystemId = [0, 0, 0, 0];

// =============================================================================
// PROJECTIONS
// =============================================================================

/// An indexed, ownable, spendable value unit.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique unit identifier.
    pub id: UnitId,
    /// Bill value in base units.
    pub value: u64,
    /// Hash of the transaction that last mutated this bill.
    pub tx_hash: Hash,
    /// Opaque ownership condition; the secondary index key.
    #[serde_as(as = "Bytes")]
    pub owner_predicate: Vec<u8>,
    /// Set when the bill was produced by a dust transfer and awaits a swap.
    pub dc_target_unit_id: Option<UnitId>,
}

impl Bill {
    /// Create a plain (non-dust) bill.
    pub fn new(id: UnitId, value: u64, tx_hash: Hash, owner_predicate: Vec<u8>) -> Self {
        Self {
            id,
            value,
            tx_hash,
            owner_predicate,
            dc_target_unit_id: None,
        }
    }

    /// Whether the bill is pending dust consolidation.
    pub fn is_dc_bill(&self) -> bool {
        self.dc_target_unit_id.is_some()
    }
}

/// A per-account prepaid balance that funds transaction fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCreditBill {
    /// Fee credit record identifier.
    pub id: UnitId,
    /// Remaining credit.
    pub value: u64,
    /// Hash of the transaction that last mutated this record.
    pub tx_hash: Hash,
    /// Round number of the last update.
    pub fc_block_number: u64,
    /// Hash of the last AddFeeCredit transaction.
    pub last_add_fc_tx_hash: Option<Hash>,
}

// =============================================================================
// PARTITION METADATA
// =============================================================================

/// Reference to the bill collecting a partition's fees.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCreditBillRef {
    pub unit_id: UnitId,
    #[serde_as(as = "Bytes")]
    pub owner_predicate: Vec<u8>,
}

/// Describes a partition and where its fees accumulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDescriptionRecord {
    pub system_identifier: SystemId,
    pub name: String,
    pub fee_credit_bill: FeeCreditBillRef,
}

// =============================================================================
// HISTORY
// =============================================================================

/// Direction of a history entry relative to the owner it is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxHistoryKind {
    Incoming,
    Outgoing,
}

impl TxHistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxHistoryKind::Incoming => "INCOMING",
            TxHistoryKind::Outgoing => "OUTGOING",
        }
    }
}

/// Whether the transaction has been seen in a processed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxHistoryState {
    Unconfirmed,
    Confirmed,
}

impl TxHistoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxHistoryState::Unconfirmed => "UNCONFIRMED",
            TxHistoryState::Confirmed => "CONFIRMED",
        }
    }
}

/// One entry of an owner's transaction history.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHistoryRecord {
    pub tx_hash: Hash,
    pub unit_id: UnitId,
    pub kind: TxHistoryKind,
    pub state: TxHistoryState,
    pub amount: u64,
    /// Owner predicate of the other party.
    #[serde_as(as = "Bytes")]
    pub counterparty: Vec<u8>,
    /// Round number of the confirming block.
    pub block_number: Option<u64>,
}
