//! # Test Fixtures

use shared_types::{
    Block, Bill, ClientMetadata, FeeCreditBillRef, Payload, PayloadAttributes, PubKey,
    SplitAttributes, SystemDescriptionRecord, TransactionOrder, TransactionRecord,
    TransferAttributes, UnitId, MONEY_SYSTEM_ID, ZERO_HASH,
};
use wb_01_bill_store::GenesisState;

pub const FEE_BILL: UnitId = [0xfe; 32];

pub fn pubkey(seed: u8) -> PubKey {
    let mut bytes = vec![0x03];
    bytes.extend_from_slice(&[seed; 32]);
    PubKey::from_bytes(bytes).unwrap()
}

pub fn unit(n: u8) -> UnitId {
    let mut id = [0u8; 32];
    id[31] = n;
    id
}

pub fn genesis(initial_bill: Option<Bill>) -> GenesisState {
    GenesisState {
        system_description_records: vec![SystemDescriptionRecord {
            system_identifier: MONEY_SYSTEM_ID,
            name: "money".to_string(),
            fee_credit_bill: FeeCreditBillRef {
                unit_id: FEE_BILL,
                owner_predicate: vec![0x53, 0x51],
            },
        }],
        initial_bill,
    }
}

pub fn order<A: PayloadAttributes>(unit_id: UnitId, attrs: &A) -> TransactionOrder {
    TransactionOrder {
        payload: Payload {
            system_id: MONEY_SYSTEM_ID,
            payload_type: A::PAYLOAD_TYPE.to_string(),
            unit_id,
            attributes: attrs.to_bytes().unwrap(),
            client_metadata: ClientMetadata {
                timeout: 1_000,
                max_transaction_fee: 1,
                fee_credit_record_id: None,
            },
        },
        owner_proof: vec![0x01],
        fee_proof: vec![],
    }
}

/// A fee-free record of `attrs` on `unit_id`.
pub fn record<A: PayloadAttributes>(unit_id: UnitId, attrs: &A) -> TransactionRecord {
    TransactionRecord::new(order(unit_id, attrs), 0)
}

pub fn transfer(to: &PubKey, value: u64) -> TransferAttributes {
    TransferAttributes {
        new_bearer: to.owner_predicate(),
        target_value: value,
        backlink: ZERO_HASH,
    }
}

pub fn split(to: &PubKey, amount: u64, remaining_value: u64) -> SplitAttributes {
    SplitAttributes {
        amount,
        target_bearer: to.owner_predicate(),
        remaining_value,
        backlink: ZERO_HASH,
    }
}

pub fn block(round_number: u64, transactions: Vec<TransactionRecord>) -> Block {
    Block {
        system_identifier: MONEY_SYSTEM_ID,
        round_number,
        previous_block_hash: ZERO_HASH,
        transactions,
    }
}
