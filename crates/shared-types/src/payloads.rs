//! # Payload Variants
//!
//! The closed set of money-partition transaction kinds. Attributes are
//! decoded from the CBOR bytes carried by `Payload::attributes`; anything
//! with an unrecognised `payload_type` decodes to `TxPayload::Unknown`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::encoding::{from_cbor, to_cbor};
use crate::entities::{Hash, SystemId, UnitId};
use crate::errors::DecodeError;
use crate::transaction::{TransactionOrder, TransactionRecord};

pub const PAYLOAD_TYPE_TRANSFER: &str = "trans";
pub const PAYLOAD_TYPE_TRANSFER_DC: &str = "transDC";
pub const PAYLOAD_TYPE_SPLIT: &str = "split";
pub const PAYLOAD_TYPE_SWAP_DC: &str = "swapDC";
pub const PAYLOAD_TYPE_TRANSFER_FEE_CREDIT: &str = "transFC";
pub const PAYLOAD_TYPE_ADD_FEE_CREDIT: &str = "addFC";
pub const PAYLOAD_TYPE_CLOSE_FEE_CREDIT: &str = "closeFC";
pub const PAYLOAD_TYPE_RECLAIM_FEE_CREDIT: &str = "reclFC";

/// Attribute types tied to a payload type tag.
pub trait PayloadAttributes: Serialize + DeserializeOwned {
    const PAYLOAD_TYPE: &'static str;

    fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        to_cbor(self)
    }
}

// =============================================================================
// BILL TRANSACTIONS
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAttributes {
    #[serde_as(as = "Bytes")]
    pub new_bearer: Vec<u8>,
    pub target_value: u64,
    pub backlink: Hash,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDcAttributes {
    pub value: u64,
    pub target_unit_id: UnitId,
    #[serde_as(as = "Bytes")]
    pub target_bearer: Vec<u8>,
    pub backlink: Hash,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAttributes {
    pub amount: u64,
    #[serde_as(as = "Bytes")]
    pub target_bearer: Vec<u8>,
    pub remaining_value: u64,
    pub backlink: Hash,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapDcAttributes {
    #[serde_as(as = "Bytes")]
    pub owner_condition: Vec<u8>,
    /// Dust bills consumed by the swap.
    pub bill_identifiers: Vec<UnitId>,
    pub target_value: u64,
}

// =============================================================================
// FEE CREDIT TRANSACTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFeeCreditAttributes {
    pub amount: u64,
    pub target_system_identifier: SystemId,
    pub target_record_id: UnitId,
    pub earliest_addition_time: u64,
    pub latest_addition_time: u64,
    pub nonce: Option<Hash>,
    pub backlink: Hash,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFeeCreditAttributes {
    #[serde_as(as = "Bytes")]
    pub fee_credit_owner_condition: Vec<u8>,
    /// The `transFC` record being redeemed.
    pub fee_credit_transfer: TransactionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseFeeCreditAttributes {
    pub amount: u64,
    /// Bill that receives the value on reclaim.
    pub target_unit_id: UnitId,
    pub nonce: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclaimFeeCreditAttributes {
    /// The `closeFC` record being reclaimed.
    pub close_fee_credit_transfer: TransactionRecord,
    pub backlink: Hash,
}

impl PayloadAttributes for TransferAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_TRANSFER;
}
impl PayloadAttributes for TransferDcAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_TRANSFER_DC;
}
impl PayloadAttributes for SplitAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_SPLIT;
}
impl PayloadAttributes for SwapDcAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_SWAP_DC;
}
impl PayloadAttributes for TransferFeeCreditAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_TRANSFER_FEE_CREDIT;
}
impl PayloadAttributes for AddFeeCreditAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_ADD_FEE_CREDIT;
}
impl PayloadAttributes for CloseFeeCreditAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_CLOSE_FEE_CREDIT;
}
impl PayloadAttributes for ReclaimFeeCreditAttributes {
    const PAYLOAD_TYPE: &'static str = PAYLOAD_TYPE_RECLAIM_FEE_CREDIT;
}

// =============================================================================
// DECODED PAYLOAD
// =============================================================================

/// A transaction payload decoded by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    Transfer(TransferAttributes),
    TransferDc(TransferDcAttributes),
    Split(SplitAttributes),
    SwapDc(SwapDcAttributes),
    TransferFeeCredit(TransferFeeCreditAttributes),
    AddFeeCredit(AddFeeCreditAttributes),
    CloseFeeCredit(CloseFeeCreditAttributes),
    ReclaimFeeCredit(ReclaimFeeCreditAttributes),
    /// A payload type this indexer does not model.
    Unknown(String),
}

impl TxPayload {
    /// Decode the attributes of `order` according to its payload type.
    pub fn decode(order: &TransactionOrder) -> Result<Self, DecodeError> {
        let attrs = order.payload.attributes.as_slice();
        let payload = match order.payload_type() {
            PAYLOAD_TYPE_TRANSFER => TxPayload::Transfer(from_cbor(attrs)?),
            PAYLOAD_TYPE_TRANSFER_DC => TxPayload::TransferDc(from_cbor(attrs)?),
            PAYLOAD_TYPE_SPLIT => TxPayload::Split(from_cbor(attrs)?),
            PAYLOAD_TYPE_SWAP_DC => TxPayload::SwapDc(from_cbor(attrs)?),
            PAYLOAD_TYPE_TRANSFER_FEE_CREDIT => TxPayload::TransferFeeCredit(from_cbor(attrs)?),
            PAYLOAD_TYPE_ADD_FEE_CREDIT => TxPayload::AddFeeCredit(from_cbor(attrs)?),
            PAYLOAD_TYPE_CLOSE_FEE_CREDIT => TxPayload::CloseFeeCredit(from_cbor(attrs)?),
            PAYLOAD_TYPE_RECLAIM_FEE_CREDIT => TxPayload::ReclaimFeeCredit(from_cbor(attrs)?),
            other => TxPayload::Unknown(other.to_string()),
        };
        Ok(payload)
    }

    /// Whether the transaction pays its fee from a fee credit record.
    pub fn is_fee_credit_paid(&self) -> bool {
        matches!(
            self,
            TxPayload::Transfer(_) | TxPayload::TransferDc(_) | TxPayload::Split(_) | TxPayload::SwapDc(_)
        )
    }
}
