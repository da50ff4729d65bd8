//! # Transaction Overlay
//!
//! Pending writes of one transaction, layered over the committed state.
//! Reads see the overlay first; nothing reaches the key-value store until
//! the owning `KvBillStore` commits the overlay as a single batch.

use std::collections::BTreeMap;
use std::ops::Bound;

use shared_types::{
    Bill, FeeCreditBill, Proof, SystemDescriptionRecord, SystemId, TransactionRecord,
    TxHistoryRecord, UnitId,
};

use super::view::{decode_u64, encode, RawView};
use crate::domain::errors::StoreError;
use crate::domain::keys::KeyPrefix;
use crate::ports::inbound::{BillStoreRead, BillStoreTx};
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

/// A transaction-scoped view of the store.
pub struct StoreTx<'a, KV: KeyValueStore> {
    base: &'a KV,
    /// `None` marks a deletion.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, KV: KeyValueStore> StoreTx<'a, KV> {
    pub(crate) fn new(base: &'a KV) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// The pending writes as one batch.
    pub(crate) fn into_operations(self) -> Vec<BatchOperation> {
        self.writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }
}

impl<KV: KeyValueStore> RawView for StoreTx<'_, KV> {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => Ok(self.base.get(key)?),
        }
    }

    fn raw_scan(&self, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> Result<ScanResult, StoreError> {
        let from = match start {
            Some(start) if start > prefix => start,
            _ => prefix,
        };
        let pending: Vec<_> = self
            .writes
            .range::<[u8], _>((Bound::Included(from), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .collect();

        // Each pending entry hides at most one committed entry, so reading
        // `limit + pending` committed entries is enough to fill the page.
        let base_limit = limit.saturating_add(pending.len());
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.scan(prefix, Some(from), base_limit)?.into_iter().collect();
        for (key, value) in pending {
            match value {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }
        Ok(merged.into_iter().take(limit).collect())
    }
}

impl<KV: KeyValueStore> BillStoreTx for StoreTx<'_, KV> {
    fn set_block_number(&mut self, block_number: u64) -> Result<(), StoreError> {
        self.put(KeyPrefix::block_number_key(), block_number.to_be_bytes().to_vec());
        Ok(())
    }

    fn set_bill(&mut self, bill: &Bill, proof: Option<&Proof>) -> Result<(), StoreError> {
        if let Some(previous) = self.get_bill(&bill.id)? {
            if previous.owner_predicate != bill.owner_predicate {
                self.delete(KeyPrefix::owner_key(&previous.owner_predicate, &bill.id));
            }
        }
        self.put(KeyPrefix::unit_key(&bill.id), encode(bill)?);
        self.put(KeyPrefix::owner_key(&bill.owner_predicate, &bill.id), Vec::new());
        if let Some(proof) = proof {
            self.put(KeyPrefix::proof_key(&bill.id, &bill.tx_hash), encode(proof)?);
        }
        Ok(())
    }

    fn remove_bill(&mut self, id: &UnitId) -> Result<(), StoreError> {
        if let Some(bill) = self.get_bill(id)? {
            self.delete(KeyPrefix::unit_key(id));
            self.delete(KeyPrefix::owner_key(&bill.owner_predicate, id));
        }
        Ok(())
    }

    fn set_bill_expiration_time(&mut self, height: u64, id: &UnitId) -> Result<(), StoreError> {
        self.put(KeyPrefix::expiration_key(height, id), Vec::new());
        Ok(())
    }

    fn delete_expired_bills(&mut self, height: u64) -> Result<usize, StoreError> {
        let prefix = KeyPrefix::Expiration.as_bytes();
        let mut removed = 0;
        for (key, _) in self.raw_scan(prefix, None, usize::MAX)? {
            let (expires_at, id) = KeyPrefix::parse_expiration_key(&key).ok_or_else(|| {
                StoreError::IndexCorruption {
                    message: format!("malformed expiration key of {} bytes", key.len()),
                }
            })?;
            if expires_at > height {
                break;
            }
            self.delete(key);
            // Swapped or re-transferred bills are no longer dust and stay
            if let Some(bill) = self.get_bill(&id)? {
                if bill.is_dc_bill() {
                    self.remove_bill(&id)?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn set_fee_credit_bill(&mut self, fcb: &FeeCreditBill, proof: Option<&Proof>) -> Result<(), StoreError> {
        self.put(KeyPrefix::fee_credit_bill_key(&fcb.id), encode(fcb)?);
        if let Some(proof) = proof {
            self.put(KeyPrefix::proof_key(&fcb.id, &fcb.tx_hash), encode(proof)?);
        }
        Ok(())
    }

    fn set_system_description_records(
        &mut self,
        records: &[SystemDescriptionRecord],
    ) -> Result<(), StoreError> {
        for record in records {
            self.put(
                KeyPrefix::system_description_key(&record.system_identifier),
                encode(record)?,
            );
        }
        Ok(())
    }

    fn set_locked_fee_credit(
        &mut self,
        system_id: &SystemId,
        fcb_id: &UnitId,
        record: &TransactionRecord,
    ) -> Result<(), StoreError> {
        self.put(KeyPrefix::locked_fee_credit_key(system_id, fcb_id), encode(record)?);
        Ok(())
    }

    fn set_closed_fee_credit(&mut self, fcb_id: &UnitId, record: &TransactionRecord) -> Result<(), StoreError> {
        self.put(KeyPrefix::closed_fee_credit_key(fcb_id), encode(record)?);
        Ok(())
    }

    fn store_tx_history_record(
        &mut self,
        owner_predicate: &[u8],
        record: &TxHistoryRecord,
    ) -> Result<(), StoreError> {
        let index_key = KeyPrefix::tx_history_index_key(owner_predicate, &record.tx_hash, record.kind);
        let seq = match self.raw_get(&index_key)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => {
                let seq_key = KeyPrefix::tx_history_seq_key();
                let next = match self.raw_get(&seq_key)? {
                    Some(bytes) => decode_u64(&bytes)? + 1,
                    None => 1,
                };
                self.put(seq_key, next.to_be_bytes().to_vec());
                self.put(index_key, next.to_be_bytes().to_vec());
                next
            }
        };
        self.put(KeyPrefix::tx_history_key(owner_predicate, seq), encode(record)?);
        Ok(())
    }
}
