//! # Indexing Scenarios
//!
//! Block processor and durable store together: a wallet payment built from
//! several bills, dust collection, and restart/resume.

use std::sync::Arc;

use shared_types::{
    same_shard_id, Bill, PubKey, SwapDcAttributes, TransferDcAttributes, TxHistoryKind,
    TxHistoryState, UnitId, ZERO_HASH,
};
use wb_01_bill_store::{BillStore, BillStoreRead, FileBillStore, StoreError};
use wb_02_block_processor::{BlockProcessor, BlockProcessorApi, ProcessingError, ProcessorConfig};

use crate::fixtures::{block, genesis, pubkey, record, split, transfer, unit};

fn balance<S: BillStoreRead>(store: &S, owner: &PubKey) -> u64 {
    store
        .get_bills(&owner.owner_predicate(), None, 100)
        .unwrap()
        .bills
        .iter()
        .map(|b| b.value)
        .sum()
}

fn seed(store: &FileBillStore, bills: &[Bill]) {
    store.initialize(&genesis(None)).unwrap();
    store
        .with_transaction(|tx| {
            for bill in bills {
                tx.set_bill(bill, None)?;
            }
            Ok::<_, StoreError>(())
        })
        .unwrap();
}

fn open(dir: &tempfile::TempDir) -> Arc<FileBillStore> {
    Arc::new(FileBillStore::open(dir.path()).unwrap())
}

#[test]
fn test_payment_from_three_bills_conserves_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    let (x, y) = (pubkey(1), pubkey(2));
    let (a, b, c): (UnitId, UnitId, UnitId) = (unit(0xa), unit(0xb), unit(0xc));
    seed(
        store.as_ref(),
        &[
            Bill::new(a, 5, ZERO_HASH, x.owner_predicate()),
            Bill::new(b, 3, ZERO_HASH, x.owner_predicate()),
            Bill::new(c, 1, ZERO_HASH, x.owner_predicate()),
        ],
    );
    assert_eq!(balance(store.as_ref(), &x), 9);

    // Pay 7: all of A, and 2 split off B
    let pay_a = record(a, &transfer(&y, 5));
    let split_b = record(b, &split(&y, 2, 1));
    let split_hash = split_b.transaction_order.hash().unwrap();
    let processor = BlockProcessor::new(Arc::clone(&store), ProcessorConfig::default());
    processor
        .process_block(&block(1, vec![pay_a.clone(), split_b.clone()]))
        .unwrap();

    assert_eq!(balance(store.as_ref(), &y), 7);
    assert_eq!(balance(store.as_ref(), &x), 2);
    assert_eq!(store.get_bill(&b).unwrap().unwrap().value, 1);
    assert_eq!(store.get_bill(&c).unwrap().unwrap().value, 1);
    let new_bill = store.get_bill(&same_shard_id(&b, &split_hash)).unwrap().unwrap();
    assert_eq!(new_bill.value, 2);
    assert_eq!(new_bill.owner_predicate, y.owner_predicate());

    // Both spends are confirmed outgoing history for X
    let history = store
        .get_tx_history_records(&x.owner_predicate(), None, 10)
        .unwrap()
        .records;
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|r| r.kind == TxHistoryKind::Outgoing && r.state == TxHistoryState::Confirmed));
    assert_eq!(history.iter().map(|r| r.amount).sum::<u64>(), 7);

    // The new bill's proof verifies against the block's transaction root
    let proof = store
        .get_tx_proof(&new_bill.id, &split_hash)
        .unwrap()
        .unwrap();
    assert_eq!(proof.tx_proof.block_number, 1);
    assert_eq!(proof.tx_proof.tx_index, 1);
    assert!(proof.tx_proof.verify(&split_b.hash().unwrap()));
}

#[test]
fn test_dust_collection_consolidates_bills() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    let x = pubkey(1);
    let target = unit(0x10);
    seed(
        store.as_ref(),
        &[
            Bill::new(target, 10, ZERO_HASH, x.owner_predicate()),
            Bill::new(unit(1), 2, ZERO_HASH, x.owner_predicate()),
            Bill::new(unit(2), 3, ZERO_HASH, x.owner_predicate()),
        ],
    );
    let processor = BlockProcessor::new(
        Arc::clone(&store),
        ProcessorConfig {
            dust_bill_deletion_timeout: 10,
            ..ProcessorConfig::default()
        },
    );

    let to_dust = |id: UnitId, value: u64| {
        record(
            id,
            &TransferDcAttributes {
                value,
                target_unit_id: target,
                target_bearer: x.owner_predicate(),
                backlink: ZERO_HASH,
            },
        )
    };
    processor
        .process_block(&block(1, vec![to_dust(unit(1), 2), to_dust(unit(2), 3)]))
        .unwrap();
    assert!(store.get_bill(&unit(1)).unwrap().unwrap().is_dc_bill());

    let swap = record(
        target,
        &SwapDcAttributes {
            owner_condition: x.owner_predicate(),
            bill_identifiers: vec![unit(1), unit(2)],
            target_value: 15,
        },
    );
    processor.process_block(&block(2, vec![swap])).unwrap();

    let bills = store
        .get_bills(&x.owner_predicate(), None, 100)
        .unwrap()
        .bills;
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].id, target);
    assert_eq!(bills[0].value, 15);

    // Expiry of the swapped dust finds nothing left to delete
    let summary = processor.process_block(&block(11, vec![])).unwrap();
    assert_eq!(summary.expired_bills_removed, 0);
}

#[test]
fn test_unswapped_dust_expires() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    let x = pubkey(1);
    seed(store.as_ref(), &[Bill::new(unit(1), 2, ZERO_HASH, x.owner_predicate())]);
    let processor = BlockProcessor::new(
        Arc::clone(&store),
        ProcessorConfig {
            dust_bill_deletion_timeout: 3,
            ..ProcessorConfig::default()
        },
    );

    let dust = record(
        unit(1),
        &TransferDcAttributes {
            value: 2,
            target_unit_id: unit(0x10),
            target_bearer: x.owner_predicate(),
            backlink: ZERO_HASH,
        },
    );
    processor.process_block(&block(5, vec![dust])).unwrap();
    processor.process_block(&block(7, vec![])).unwrap();
    assert_eq!(balance(store.as_ref(), &x), 2);

    let summary = processor.process_block(&block(8, vec![])).unwrap();
    assert_eq!(summary.expired_bills_removed, 1);
    assert_eq!(balance(store.as_ref(), &x), 0);
}

#[test]
fn test_restart_resumes_after_stored_round() {
    let dir = tempfile::tempdir().unwrap();
    let x = pubkey(1);
    let y = pubkey(2);
    {
        let store = open(&dir);
        seed(store.as_ref(), &[Bill::new(unit(1), 5, ZERO_HASH, x.owner_predicate())]);
        let processor = BlockProcessor::new(store, ProcessorConfig::default());
        for round in 1..=3 {
            processor.process_block(&block(round, vec![])).unwrap();
        }
    }

    let store = open(&dir);
    let processor = BlockProcessor::new(Arc::clone(&store), ProcessorConfig::default());
    assert_eq!(processor.last_indexed_round().unwrap(), 3);

    let err = processor.process_block(&block(3, vec![])).unwrap_err();
    assert!(matches!(err, ProcessingError::NonMonotonicRound { stored: 3, received: 3 }));

    processor
        .process_block(&block(4, vec![record(unit(1), &transfer(&y, 5))]))
        .unwrap();
    assert_eq!(balance(store.as_ref(), &y), 5);
    assert_eq!(store.get_block_number().unwrap(), 4);
}

#[test]
fn test_rejected_block_leaves_durable_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    let x = pubkey(1);
    let y = pubkey(2);
    seed(store.as_ref(), &[Bill::new(unit(1), 5, ZERO_HASH, x.owner_predicate())]);
    let processor = BlockProcessor::new(Arc::clone(&store), ProcessorConfig::default());

    // The fee is charged to a fee credit record that does not exist
    let mut paid = record(unit(1), &transfer(&y, 5));
    paid.server_metadata.actual_fee = 1;
    paid.transaction_order.payload.client_metadata.fee_credit_record_id = Some(unit(0xfc));
    let err = processor
        .process_block(&block(1, vec![record(unit(1), &transfer(&y, 5)), paid]))
        .unwrap_err();
    assert!(err.is_fatal());

    drop(processor);
    drop(store);
    let reopened = open(&dir);
    assert_eq!(reopened.get_block_number().unwrap(), 0);
    assert_eq!(balance(reopened.as_ref(), &x), 5);
    assert_eq!(balance(reopened.as_ref(), &y), 0);
}

#[test]
fn test_unindexed_split_source_is_counted() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    store.initialize(&genesis(None)).unwrap();
    let y = pubkey(2);
    let processor = BlockProcessor::new(Arc::clone(&store), ProcessorConfig::default());

    processor
        .process_block(&block(1, vec![record(unit(7), &split(&y, 4, 6))]))
        .unwrap();

    assert_eq!(processor.metrics().missing_split_sources(), 1);
    assert_eq!(balance(store.as_ref(), &y), 4);
    assert!(store.get_bill(&unit(7)).unwrap().is_none());
}
