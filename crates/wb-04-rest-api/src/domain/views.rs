//! # JSON Views
//!
//! Wire shapes of the REST surface. Byte fields are `0x`-prefixed hex,
//! 64-bit amounts and round numbers are decimal strings.

use serde::{Deserialize, Serialize};
use shared_types::{
    encode_hex, to_cbor, Bill, DecodeError, FeeCreditBill, Proof, ProofNode, SiblingPosition,
    TransactionRecord, TxHistoryRecord, TxProof,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: String,
    pub value: String,
    pub tx_hash: String,
    pub owner_predicate: String,
    pub is_dc_bill: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc_target_unit_id: Option<String>,
}

impl From<&Bill> for BillView {
    fn from(bill: &Bill) -> Self {
        Self {
            id: encode_hex(&bill.id),
            value: bill.value.to_string(),
            tx_hash: encode_hex(&bill.tx_hash),
            owner_predicate: encode_hex(&bill.owner_predicate),
            is_dc_bill: bill.is_dc_bill(),
            dc_target_unit_id: bill.dc_target_unit_id.as_ref().map(|id| encode_hex(id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBillsResponse {
    pub total: usize,
    pub bills: Vec<BillView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundNumberResponse {
    pub round_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub system_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCreditBillView {
    pub id: String,
    pub value: String,
    pub tx_hash: String,
    pub fc_block_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_add_fc_tx_hash: Option<String>,
}

impl From<&FeeCreditBill> for FeeCreditBillView {
    fn from(fcb: &FeeCreditBill) -> Self {
        Self {
            id: encode_hex(&fcb.id),
            value: fcb.value.to_string(),
            tx_hash: encode_hex(&fcb.tx_hash),
            fc_block_number: fcb.fc_block_number.to_string(),
            last_add_fc_tx_hash: fcb.last_add_fc_tx_hash.as_ref().map(|h| encode_hex(h)),
        }
    }
}

/// A transaction record with its CBOR encoding for clients that re-verify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecordView {
    pub tx_hash: String,
    pub system_id: String,
    pub payload_type: String,
    pub unit_id: String,
    pub actual_fee: String,
    /// CBOR of the whole record.
    pub record: String,
}

impl TxRecordView {
    pub fn from_record(record: &TransactionRecord) -> Result<Self, DecodeError> {
        let order = &record.transaction_order;
        Ok(Self {
            tx_hash: encode_hex(&order.hash()?),
            system_id: encode_hex(order.system_id()),
            payload_type: order.payload_type().to_string(),
            unit_id: encode_hex(order.unit_id()),
            actual_fee: record.actual_fee().to_string(),
            record: encode_hex(&to_cbor(record)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNodeView {
    pub hash: String,
    /// `left` or `right`.
    pub position: String,
}

impl From<&ProofNode> for ProofNodeView {
    fn from(node: &ProofNode) -> Self {
        let position = match node.position {
            SiblingPosition::Left => "left",
            SiblingPosition::Right => "right",
        };
        Self {
            hash: encode_hex(&node.hash),
            position: position.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxProofView {
    pub block_number: String,
    pub tx_index: u32,
    pub block_hash: String,
    pub tx_root: String,
    pub chain: Vec<ProofNodeView>,
}

impl From<&TxProof> for TxProofView {
    fn from(proof: &TxProof) -> Self {
        Self {
            block_number: proof.block_number.to_string(),
            tx_index: proof.tx_index,
            block_hash: encode_hex(&proof.block_hash),
            tx_root: encode_hex(&proof.tx_root),
            chain: proof.chain.iter().map(ProofNodeView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofView {
    pub tx_record: TxRecordView,
    pub tx_proof: TxProofView,
}

impl ProofView {
    pub fn from_proof(proof: &Proof) -> Result<Self, DecodeError> {
        Ok(Self {
            tx_record: TxRecordView::from_record(&proof.tx_record)?,
            tx_proof: TxProofView::from(&proof.tx_proof),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHistoryView {
    pub tx_hash: String,
    pub unit_id: String,
    pub kind: String,
    pub state: String,
    pub amount: String,
    pub counterparty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
}

impl From<&TxHistoryRecord> for TxHistoryView {
    fn from(record: &TxHistoryRecord) -> Self {
        Self {
            tx_hash: encode_hex(&record.tx_hash),
            unit_id: encode_hex(&record.unit_id),
            kind: record.kind.as_str().to_string(),
            state: record.state.as_str().to_string(),
            amount: record.amount.to_string(),
            counterparty: encode_hex(&record.counterparty),
            block_number: record.block_number.map(|n| n.to_string()),
        }
    }
}
