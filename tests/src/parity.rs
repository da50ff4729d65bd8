//! # Store Backend Parity
//!
//! Every check runs against each entry of `backends()`. The in-memory and
//! file-backed stores share one contract and must be indistinguishable
//! through it.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use shared_types::{Bill, TxHistoryKind, TxHistoryRecord, TxHistoryState, UnitId, ZERO_HASH};
use tempfile::TempDir;
use wb_01_bill_store::{
    BillStore, BillStoreRead, FileBillStore, InMemoryBillStore, StoreError, MAX_PAGE_LIMIT,
};

use crate::fixtures::{genesis, unit};

enum Backend {
    Memory(InMemoryBillStore),
    /// The directory lives as long as the store.
    File(FileBillStore, TempDir),
}

fn backends() -> Vec<(&'static str, Backend)> {
    let dir = tempfile::tempdir().unwrap();
    let file = FileBillStore::open(dir.path()).unwrap();
    vec![
        ("in-memory", Backend::Memory(InMemoryBillStore::in_memory())),
        ("file", Backend::File(file, dir)),
    ]
}

/// Run `$check(name, &store)` on every backend.
macro_rules! for_each_backend {
    ($check:expr) => {
        for (name, backend) in backends() {
            match &backend {
                Backend::Memory(store) => $check(name, store),
                Backend::File(store, _) => $check(name, store),
            }
        }
    };
}

const OWNER_A: &[u8] = b"owner-a";
const OWNER_B: &[u8] = b"owner-b";

fn put_bills<S: BillStore>(store: &S, bills: &[Bill]) {
    store
        .with_transaction(|tx| {
            for bill in bills {
                tx.set_bill(bill, None)?;
            }
            Ok::<_, StoreError>(())
        })
        .unwrap();
}

fn ids<S: BillStore>(store: &S, owner: &[u8]) -> Vec<UnitId> {
    let mut all = Vec::new();
    let mut offset = None;
    loop {
        let page = store.get_bills(owner, offset.as_ref(), MAX_PAGE_LIMIT).unwrap();
        all.extend(page.bills.iter().map(|b| b.id));
        match page.next_key {
            Some(next) => offset = Some(next),
            None => return all,
        }
    }
}

// =============================================================================
// TABLE-DRIVEN CHECKS
// =============================================================================

fn check_owner_change<S: BillStore>(name: &str, store: &S) {
    put_bills(store, &[Bill::new(unit(1), 5, ZERO_HASH, OWNER_A.to_vec())]);
    put_bills(store, &[Bill::new(unit(1), 5, [1; 32], OWNER_B.to_vec())]);

    assert!(ids(store, OWNER_A).is_empty(), "{name}");
    assert_eq!(ids(store, OWNER_B), vec![unit(1)], "{name}");
}

fn check_failed_transaction<S: BillStore>(name: &str, store: &S) {
    put_bills(store, &[Bill::new(unit(1), 5, ZERO_HASH, OWNER_A.to_vec())]);

    let result: Result<(), StoreError> = store.with_transaction(|tx| {
        tx.set_block_number(9)?;
        tx.remove_bill(&unit(1))?;
        tx.set_bill(&Bill::new(unit(2), 3, ZERO_HASH, OWNER_B.to_vec()), None)?;
        Err(StoreError::Serialization {
            message: "third write failed".into(),
        })
    });

    assert!(result.is_err(), "{name}");
    assert_eq!(store.get_block_number().unwrap(), 0, "{name}");
    assert_eq!(ids(store, OWNER_A), vec![unit(1)], "{name}");
    assert!(store.get_bill(&unit(2)).unwrap().is_none(), "{name}");
}

fn check_remove_twice<S: BillStore>(name: &str, store: &S) {
    put_bills(store, &[Bill::new(unit(1), 5, ZERO_HASH, OWNER_A.to_vec())]);
    for _ in 0..2 {
        store
            .with_transaction(|tx| tx.remove_bill(&unit(1)))
            .unwrap();
    }
    assert!(store.get_bill(&unit(1)).unwrap().is_none(), "{name}");
    assert!(ids(store, OWNER_A).is_empty(), "{name}");
}

fn check_dust_expiration<S: BillStore>(name: &str, store: &S) {
    let created_at = 10;
    let timeout = 5;
    let mut dust = Bill::new(unit(1), 2, ZERO_HASH, OWNER_A.to_vec());
    dust.dc_target_unit_id = Some(unit(9));
    // Swapped before expiry, no longer dust
    let swapped = Bill::new(unit(2), 3, ZERO_HASH, OWNER_A.to_vec());

    store
        .with_transaction(|tx| {
            tx.set_bill(&dust, None)?;
            tx.set_bill(&swapped, None)?;
            tx.set_bill_expiration_time(created_at + timeout, &dust.id)?;
            tx.set_bill_expiration_time(created_at + timeout, &swapped.id)
        })
        .unwrap();

    for height in created_at..created_at + timeout {
        let removed = store
            .with_transaction(|tx| tx.delete_expired_bills(height))
            .unwrap();
        assert_eq!(removed, 0, "{name} at {height}");
        assert_eq!(ids(store, OWNER_A).len(), 2, "{name} at {height}");
    }

    let removed = store
        .with_transaction(|tx| tx.delete_expired_bills(created_at + timeout))
        .unwrap();
    assert_eq!(removed, 1, "{name}");
    assert_eq!(ids(store, OWNER_A), vec![unit(2)], "{name}");

    // Expiration index drained
    let removed = store
        .with_transaction(|tx| tx.delete_expired_bills(u64::MAX))
        .unwrap();
    assert_eq!(removed, 0, "{name}");
}

fn check_pagination<S: BillStore>(name: &str, store: &S) {
    let bills: Vec<Bill> = (0..120u8)
        .map(|n| Bill::new(unit(n), n as u64, ZERO_HASH, OWNER_A.to_vec()))
        .collect();
    put_bills(store, &bills);

    let first = store.get_bills(OWNER_A, None, 50).unwrap();
    let second = store
        .get_bills(OWNER_A, first.next_key.as_ref(), 50)
        .unwrap();
    assert_eq!(first.bills.len(), 50, "{name}");
    assert_eq!(second.bills.len(), 50, "{name}");

    let paged: Vec<UnitId> = first
        .bills
        .iter()
        .chain(second.bills.iter())
        .map(|b| b.id)
        .collect();
    assert_eq!(paged, ids(store, OWNER_A)[..100].to_vec(), "{name}");

    let beyond = store.get_bills(OWNER_A, Some(&[0xff; 32]), 50).unwrap();
    assert!(beyond.bills.is_empty(), "{name}");
    assert!(beyond.next_key.is_none(), "{name}");
}

fn check_history_updates_in_place<S: BillStore>(name: &str, store: &S) {
    let entry = |tx_hash: u8, state| TxHistoryRecord {
        tx_hash: [tx_hash; 32],
        unit_id: unit(1),
        kind: TxHistoryKind::Outgoing,
        state,
        amount: 5,
        counterparty: OWNER_B.to_vec(),
        block_number: None,
    };

    store
        .with_transaction(|tx| {
            tx.store_tx_history_record(OWNER_A, &entry(1, TxHistoryState::Unconfirmed))?;
            tx.store_tx_history_record(OWNER_A, &entry(2, TxHistoryState::Unconfirmed))?;
            tx.store_tx_history_record(OWNER_A, &entry(1, TxHistoryState::Confirmed))
        })
        .unwrap();

    let page = store.get_tx_history_records(OWNER_A, None, 10).unwrap();
    let seen: Vec<(u8, TxHistoryState)> = page
        .records
        .iter()
        .map(|r| (r.tx_hash[0], r.state))
        .collect();
    assert_eq!(
        seen,
        vec![(2, TxHistoryState::Unconfirmed), (1, TxHistoryState::Confirmed)],
        "{name}"
    );
}

#[test]
fn test_owner_change_moves_bill_between_owners() {
    for_each_backend!(check_owner_change);
}

#[test]
fn test_failed_transaction_is_invisible() {
    for_each_backend!(check_failed_transaction);
}

#[test]
fn test_remove_bill_twice_is_noop() {
    for_each_backend!(check_remove_twice);
}

#[test]
fn test_dust_expires_exactly_at_timeout() {
    for_each_backend!(check_dust_expiration);
}

#[test]
fn test_pages_are_disjoint_and_ordered() {
    for_each_backend!(check_pagination);
}

#[test]
fn test_history_is_newest_first_and_updated_in_place() {
    for_each_backend!(check_history_updates_in_place);
}

#[test]
fn test_initialize_seeds_once() {
    let initial = Bill::new(unit(1), 1_000, ZERO_HASH, OWNER_A.to_vec());
    for (name, backend) in backends() {
        let (first, second) = match &backend {
            Backend::Memory(store) => (
                store.initialize(&genesis(Some(initial.clone()))).unwrap(),
                store.initialize(&genesis(Some(initial.clone()))).unwrap(),
            ),
            Backend::File(store, _) => (
                store.initialize(&genesis(Some(initial.clone()))).unwrap(),
                store.initialize(&genesis(Some(initial.clone()))).unwrap(),
            ),
        };
        assert!(first, "{name}");
        assert!(!second, "{name}");
    }
}

#[test]
fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileBillStore::open(dir.path()).unwrap();
        put_bills(&store, &[Bill::new(unit(1), 5, ZERO_HASH, OWNER_A.to_vec())]);
        store.with_transaction(|tx| tx.set_block_number(17)).unwrap();
    }

    let reopened = FileBillStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get_block_number().unwrap(), 17);
    assert_eq!(ids(&reopened, OWNER_A), vec![unit(1)]);
}

// =============================================================================
// INDEX CONSISTENCY PROPERTY
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Set { id: u8, owner: u8, value: u64 },
    Remove { id: u8 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16, 0u8..3, 1u64..1_000).prop_map(|(id, owner, value)| Op::Set { id, owner, value }),
        (0u8..16).prop_map(|id| Op::Remove { id }),
    ]
}

fn owner(n: u8) -> Vec<u8> {
    vec![0x0a, n]
}

/// Apply `ops` in blocks of three and compare every owner list with a model.
fn check_index_consistency<S: BillStore>(store: &S, ops: &[Op]) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<u8, u8> = BTreeMap::new();
    for chunk in ops.chunks(3) {
        store
            .with_transaction(|tx| {
                for op in chunk {
                    match op {
                        Op::Set { id, owner: o, value } => {
                            tx.set_bill(&Bill::new(unit(*id), *value, ZERO_HASH, owner(*o)), None)?
                        }
                        Op::Remove { id } => tx.remove_bill(&unit(*id))?,
                    }
                }
                Ok::<_, StoreError>(())
            })
            .unwrap();
        for op in chunk {
            match op {
                Op::Set { id, owner: o, .. } => {
                    model.insert(*id, *o);
                }
                Op::Remove { id } => {
                    model.remove(id);
                }
            }
        }
    }

    for o in 0u8..3 {
        let expected: BTreeSet<UnitId> = model
            .iter()
            .filter(|(_, bill_owner)| **bill_owner == o)
            .map(|(id, _)| unit(*id))
            .collect();
        let actual: BTreeSet<UnitId> = ids(store, &owner(o)).into_iter().collect();
        prop_assert_eq!(actual, expected);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_owner_index_matches_bills(ops in prop::collection::vec(op(), 1..40)) {
        for (_, backend) in backends() {
            match &backend {
                Backend::Memory(store) => check_index_consistency(store, &ops)?,
                Backend::File(store, _) => check_index_consistency(store, &ops)?,
            }
        }
    }
}
