//! # Bill Store Service
//!
//! `KvBillStore` implements the bill store contract over any
//! `KeyValueStore`.
//!
//! ## Concurrency
//!
//! - Readers take a shared lock and see one committed snapshot per call.
//! - Writers are serialized by an upgradable read lock, so readers keep
//!   going while a block is being processed.
//! - Commit persists the batch while still holding only the upgradable
//!   lock, then upgrades to the write lock just to swap it in.

mod tx;
mod view;

pub use tx::StoreTx;
pub use view::{Committed, RawView};

use std::path::Path;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use shared_types::{
    Bill, FeeCreditBill, Hash, Proof, SystemDescriptionRecord, SystemId, TransactionRecord,
    UnitId, ZERO_HASH,
};

use crate::adapters::storage::{FileBackedKVStore, InMemoryKVStore};
use crate::domain::errors::StoreError;
use crate::domain::genesis::GenesisState;
use crate::ports::inbound::{BillPage, BillStore, BillStoreRead, BillStoreTx, HistoryPage};
use crate::ports::outbound::KeyValueStore;

/// Bill store over an in-memory map.
pub type InMemoryBillStore = KvBillStore<InMemoryKVStore>;

/// Bill store persisted to a data directory.
pub type FileBillStore = KvBillStore<FileBackedKVStore>;

/// The bill store.
pub struct KvBillStore<KV: KeyValueStore> {
    kv: RwLock<KV>,
}

impl<KV: KeyValueStore> KvBillStore<KV> {
    pub fn new(kv: KV) -> Self {
        Self { kv: RwLock::new(kv) }
    }

    fn read<T>(&self, f: impl FnOnce(&Committed<'_, KV>) -> T) -> T {
        let kv = self.kv.read();
        f(&Committed(&*kv))
    }

    /// Seed an empty store with the genesis state.
    ///
    /// Returns `false` without writing anything if the store already holds
    /// partition records or has indexed a block.
    pub fn initialize(&self, genesis: &GenesisState) -> Result<bool, StoreError> {
        self.with_transaction(|tx| {
            if tx.get_block_number()? > 0 || !tx.get_system_description_records()?.is_empty() {
                return Ok(false);
            }

            tx.set_system_description_records(&genesis.system_description_records)?;
            for sdr in &genesis.system_description_records {
                let fee_bill = &sdr.fee_credit_bill;
                if tx.get_bill(&fee_bill.unit_id)?.is_none() {
                    tx.set_bill(
                        &Bill::new(fee_bill.unit_id, 0, ZERO_HASH, fee_bill.owner_predicate.clone()),
                        None,
                    )?;
                }
            }
            if let Some(bill) = &genesis.initial_bill {
                tx.set_bill(bill, None)?;
            }

            tracing::info!(
                "[wb-01] Initialized store with {} partition records",
                genesis.system_description_records.len()
            );
            Ok(true)
        })
    }
}

impl InMemoryBillStore {
    pub fn in_memory() -> Self {
        Self::new(InMemoryKVStore::new())
    }
}

impl FileBillStore {
    /// Open the durable store in `data_dir`, locking the directory.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        Ok(Self::new(FileBackedKVStore::open(data_dir)?))
    }
}

impl<KV: KeyValueStore> BillStore for KvBillStore<KV> {
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BillStoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self.kv.upgradable_read();
        let mut tx = StoreTx::new(&*guard);
        let result = f(&mut tx)?;

        let operations = tx.into_operations();
        if !operations.is_empty() {
            let prepared = guard.prepare_batch(operations).map_err(StoreError::from)?;
            let mut kv = RwLockUpgradableReadGuard::upgrade(guard);
            kv.apply_prepared(prepared);
        }
        Ok(result)
    }
}

impl<KV: KeyValueStore> BillStoreRead for KvBillStore<KV> {
    fn get_block_number(&self) -> Result<u64, StoreError> {
        self.read(|view| view.get_block_number())
    }

    fn get_bill(&self, id: &UnitId) -> Result<Option<Bill>, StoreError> {
        self.read(|view| view.get_bill(id))
    }

    fn get_bills_filtered(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&UnitId>,
        limit: usize,
        include_dc_bills: bool,
    ) -> Result<BillPage, StoreError> {
        self.read(|view| view.get_bills_filtered(owner_predicate, offset_key, limit, include_dc_bills))
    }

    fn get_balance(&self, owner_predicate: &[u8], include_dc_bills: bool) -> Result<u64, StoreError> {
        self.read(|view| view.get_balance(owner_predicate, include_dc_bills))
    }

    fn get_fee_credit_bill(&self, id: &UnitId) -> Result<Option<FeeCreditBill>, StoreError> {
        self.read(|view| view.get_fee_credit_bill(id))
    }

    fn get_tx_proof(&self, unit_id: &UnitId, tx_hash: &Hash) -> Result<Option<Proof>, StoreError> {
        self.read(|view| view.get_tx_proof(unit_id, tx_hash))
    }

    fn get_system_description_records(&self) -> Result<Vec<SystemDescriptionRecord>, StoreError> {
        self.read(|view| view.get_system_description_records())
    }

    fn get_locked_fee_credit(
        &self,
        system_id: &SystemId,
        fcb_id: &UnitId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        self.read(|view| view.get_locked_fee_credit(system_id, fcb_id))
    }

    fn get_closed_fee_credit(&self, fcb_id: &UnitId) -> Result<Option<TransactionRecord>, StoreError> {
        self.read(|view| view.get_closed_fee_credit(fcb_id))
    }

    fn get_tx_history_records(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&[u8]>,
        limit: usize,
    ) -> Result<HistoryPage, StoreError> {
        self.read(|view| view.get_tx_history_records(owner_predicate, offset_key, limit))
    }
}
