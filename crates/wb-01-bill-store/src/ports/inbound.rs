//! # Inbound Ports (Driving Ports)
//!
//! The bill store contract. Reads are available on the store itself and
//! inside a transaction; writes only inside a transaction.

use shared_types::{
    Bill, FeeCreditBill, Hash, Proof, SystemDescriptionRecord, SystemId, TransactionRecord,
    TxHistoryRecord, UnitId,
};

use crate::domain::errors::StoreError;

/// One page of an owner's bills.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillPage {
    pub bills: Vec<Bill>,
    /// Id to pass as `offset_key` for the next page; `None` at the end.
    pub next_key: Option<UnitId>,
}

/// One page of an owner's transaction history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub records: Vec<TxHistoryRecord>,
    /// Opaque cursor for the next page; `None` at the end.
    pub next_key: Option<Vec<u8>>,
}

/// Read operations of the bill store.
pub trait BillStoreRead {
    /// Last indexed round number, 0 before the first block.
    fn get_block_number(&self) -> Result<u64, StoreError>;

    fn get_bill(&self, id: &UnitId) -> Result<Option<Bill>, StoreError>;

    /// Bills of one owner in id order, starting at `offset_key`.
    ///
    /// `limit` is clamped to `MAX_PAGE_LIMIT`.
    fn get_bills(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&UnitId>,
        limit: usize,
    ) -> Result<BillPage, StoreError> {
        self.get_bills_filtered(owner_predicate, offset_key, limit, true)
    }

    /// Like `get_bills`, but dust collector bills are skipped before the
    /// page is cut when `include_dc_bills` is false. `next_key` is then the
    /// first matching bill left out of the page.
    fn get_bills_filtered(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&UnitId>,
        limit: usize,
        include_dc_bills: bool,
    ) -> Result<BillPage, StoreError>;

    /// Sum of an owner's bill values, read from a single snapshot.
    fn get_balance(&self, owner_predicate: &[u8], include_dc_bills: bool) -> Result<u64, StoreError>;

    fn get_fee_credit_bill(&self, id: &UnitId) -> Result<Option<FeeCreditBill>, StoreError>;

    /// Proof stored for the transaction `tx_hash` on unit `unit_id`.
    fn get_tx_proof(&self, unit_id: &UnitId, tx_hash: &Hash) -> Result<Option<Proof>, StoreError>;

    fn get_system_description_records(&self) -> Result<Vec<SystemDescriptionRecord>, StoreError>;

    /// Last `transFC` targeting `fcb_id` on partition `system_id`.
    fn get_locked_fee_credit(
        &self,
        system_id: &SystemId,
        fcb_id: &UnitId,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// Last `closeFC` of the fee credit bill `fcb_id`.
    fn get_closed_fee_credit(&self, fcb_id: &UnitId) -> Result<Option<TransactionRecord>, StoreError>;

    /// History of one owner, newest first.
    fn get_tx_history_records(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&[u8]>,
        limit: usize,
    ) -> Result<HistoryPage, StoreError>;
}

/// Write operations, available inside `BillStore::with_transaction`.
pub trait BillStoreTx: BillStoreRead {
    fn set_block_number(&mut self, block_number: u64) -> Result<(), StoreError>;

    /// Upsert a bill, moving its owner-index entry if the owner changed.
    fn set_bill(&mut self, bill: &Bill, proof: Option<&Proof>) -> Result<(), StoreError>;

    /// Remove a bill and its owner-index entry. Removing a missing bill is a no-op.
    fn remove_bill(&mut self, id: &UnitId) -> Result<(), StoreError>;

    /// Schedule `id` for deletion once `height` is processed.
    fn set_bill_expiration_time(&mut self, height: u64, id: &UnitId) -> Result<(), StoreError>;

    /// Drain every expiration bucket up to and including `height`.
    ///
    /// Returns the number of dust bills removed.
    fn delete_expired_bills(&mut self, height: u64) -> Result<usize, StoreError>;

    fn set_fee_credit_bill(&mut self, fcb: &FeeCreditBill, proof: Option<&Proof>) -> Result<(), StoreError>;

    fn set_system_description_records(
        &mut self,
        records: &[SystemDescriptionRecord],
    ) -> Result<(), StoreError>;

    fn set_locked_fee_credit(
        &mut self,
        system_id: &SystemId,
        fcb_id: &UnitId,
        record: &TransactionRecord,
    ) -> Result<(), StoreError>;

    fn set_closed_fee_credit(&mut self, fcb_id: &UnitId, record: &TransactionRecord) -> Result<(), StoreError>;

    /// Insert a history record, or update the one already filed for the
    /// same owner, transaction and direction.
    fn store_tx_history_record(
        &mut self,
        owner_predicate: &[u8],
        record: &TxHistoryRecord,
    ) -> Result<(), StoreError>;
}

/// The transactional bill store.
pub trait BillStore: BillStoreRead + Send + Sync {
    /// Run `f` against a transaction-scoped view.
    ///
    /// Every write made by `f` is committed together when it returns `Ok`,
    /// and discarded when it returns `Err`.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BillStoreTx) -> Result<T, E>,
        E: From<StoreError>;
}
