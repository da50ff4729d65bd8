//! # Genesis
//!
//! What an empty store is seeded with: the money partition's description
//! record (so fee bills are tracked from round 1) and, when configured, the
//! initial bill holding the money supply.

use shared_types::{Bill, FeeCreditBillRef, SystemDescriptionRecord, ZERO_HASH};
use wb_01_bill_store::GenesisState;

use crate::container::ChainConfig;

/// Owner predicate anyone can satisfy.
pub const ALWAYS_TRUE_PREDICATE: [u8; 2] = [0x53, 0x51];

/// Build the genesis state described by `chain`.
pub fn genesis_state(chain: &ChainConfig) -> GenesisState {
    let money_partition = SystemDescriptionRecord {
        system_identifier: chain.system_id,
        name: "money".to_string(),
        fee_credit_bill: FeeCreditBillRef {
            unit_id: chain.fee_bill_id,
            owner_predicate: chain.fee_bill_owner.clone(),
        },
    };
    let initial_bill = (chain.initial_bill_value > 0).then(|| {
        Bill::new(
            chain.initial_bill_id,
            chain.initial_bill_value,
            ZERO_HASH,
            chain.initial_bill_owner.clone(),
        )
    });

    GenesisState {
        system_description_records: vec![money_partition],
        initial_bill,
    }
}
