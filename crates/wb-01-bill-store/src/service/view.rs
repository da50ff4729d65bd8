//! # Typed Reads
//!
//! Every read of the bill store is written once against `RawView`, which
//! is implemented by the committed state and by the transaction overlay.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    Bill, FeeCreditBill, Hash, Proof, SystemDescriptionRecord, SystemId, TransactionRecord,
    UnitId,
};

use crate::domain::errors::StoreError;
use crate::domain::keys::KeyPrefix;
use crate::domain::MAX_PAGE_LIMIT;
use crate::ports::inbound::{BillPage, BillStoreRead, HistoryPage};
use crate::ports::outbound::{KeyValueStore, ScanResult};

/// Raw key access used by the typed reads.
pub trait RawView {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn raw_scan(&self, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> Result<ScanResult, StoreError>;
}

/// Read-only view over committed state.
pub struct Committed<'a, KV: KeyValueStore>(pub &'a KV);

impl<KV: KeyValueStore> RawView for Committed<'_, KV> {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.0.get(key)?)
    }

    fn raw_scan(&self, prefix: &[u8], start: Option<&[u8]>, limit: usize) -> Result<ScanResult, StoreError> {
        Ok(self.0.scan(prefix, start, limit)?)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| StoreError::Serialization {
        message: format!("expected 8-byte counter, got {} bytes", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(raw))
}

fn get_typed<V, T>(view: &V, key: &[u8]) -> Result<Option<T>, StoreError>
where
    V: RawView + ?Sized,
    T: DeserializeOwned,
{
    view.raw_get(key)?.map(|bytes| decode(&bytes)).transpose()
}

impl<V: RawView> BillStoreRead for V {
    fn get_block_number(&self) -> Result<u64, StoreError> {
        match self.raw_get(&KeyPrefix::block_number_key())? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn get_bill(&self, id: &UnitId) -> Result<Option<Bill>, StoreError> {
        get_typed(self, &KeyPrefix::unit_key(id))
    }

    fn get_bills_filtered(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&UnitId>,
        limit: usize,
        include_dc_bills: bool,
    ) -> Result<BillPage, StoreError> {
        let limit = limit.min(MAX_PAGE_LIMIT);
        if limit == 0 {
            return Ok(BillPage::default());
        }

        let prefix = KeyPrefix::owner_prefix(owner_predicate);
        let mut start = offset_key.map(|id| KeyPrefix::owner_key(owner_predicate, id));
        let mut bills = Vec::with_capacity(limit);
        loop {
            let entries = self.raw_scan(&prefix, start.as_deref(), limit + 1)?;
            for (key, _) in &entries {
                let id = unit_id_suffix(key)?;
                let bill = indexed_bill(self, &id)?;
                if !include_dc_bills && bill.is_dc_bill() {
                    continue;
                }
                if bills.len() == limit {
                    return Ok(BillPage { bills, next_key: Some(id) });
                }
                bills.push(bill);
            }

            // Skipped dust can leave the page short; keep scanning after the last key.
            match entries.last() {
                Some((key, _)) if entries.len() > limit => start = Some(key_after(key)),
                _ => return Ok(BillPage { bills, next_key: None }),
            }
        }
    }

    fn get_balance(&self, owner_predicate: &[u8], include_dc_bills: bool) -> Result<u64, StoreError> {
        let prefix = KeyPrefix::owner_prefix(owner_predicate);
        let mut total: u64 = 0;
        for (key, _) in self.raw_scan(&prefix, None, usize::MAX)? {
            let bill = indexed_bill(self, &unit_id_suffix(&key)?)?;
            if include_dc_bills || !bill.is_dc_bill() {
                total = total.saturating_add(bill.value);
            }
        }
        Ok(total)
    }

    fn get_fee_credit_bill(&self, id: &UnitId) -> Result<Option<FeeCreditBill>, StoreError> {
        get_typed(self, &KeyPrefix::fee_credit_bill_key(id))
    }

    fn get_tx_proof(&self, unit_id: &UnitId, tx_hash: &Hash) -> Result<Option<Proof>, StoreError> {
        get_typed(self, &KeyPrefix::proof_key(unit_id, tx_hash))
    }

    fn get_system_description_records(&self) -> Result<Vec<SystemDescriptionRecord>, StoreError> {
        self.raw_scan(KeyPrefix::SystemDescription.as_bytes(), None, usize::MAX)?
            .iter()
            .map(|(_, value)| decode(value))
            .collect()
    }

    fn get_locked_fee_credit(
        &self,
        system_id: &SystemId,
        fcb_id: &UnitId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        get_typed(self, &KeyPrefix::locked_fee_credit_key(system_id, fcb_id))
    }

    fn get_closed_fee_credit(&self, fcb_id: &UnitId) -> Result<Option<TransactionRecord>, StoreError> {
        get_typed(self, &KeyPrefix::closed_fee_credit_key(fcb_id))
    }

    fn get_tx_history_records(
        &self,
        owner_predicate: &[u8],
        offset_key: Option<&[u8]>,
        limit: usize,
    ) -> Result<HistoryPage, StoreError> {
        let limit = limit.min(MAX_PAGE_LIMIT);
        if limit == 0 {
            return Ok(HistoryPage::default());
        }

        let prefix = KeyPrefix::tx_history_prefix(owner_predicate);
        let start = offset_key.map(|suffix| [prefix.as_slice(), suffix].concat());
        let mut entries = self.raw_scan(&prefix, start.as_deref(), limit + 1)?;

        let next_key = if entries.len() > limit {
            entries.pop().map(|(key, _)| key[prefix.len()..].to_vec())
        } else {
            None
        };

        let records = entries
            .iter()
            .map(|(_, value)| decode(value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HistoryPage { records, next_key })
    }
}

/// The bill an owner-index entry points at.
fn indexed_bill<V: RawView + ?Sized>(view: &V, id: &UnitId) -> Result<Bill, StoreError> {
    get_typed(view, &KeyPrefix::unit_key(id))?.ok_or_else(|| StoreError::IndexCorruption {
        message: format!("owner index references missing bill {}", hex::encode(id)),
    })
}

/// The smallest key sorting after `key` among keys of the same length.
fn key_after(key: &[u8]) -> Vec<u8> {
    let mut next = key.to_vec();
    next.push(0);
    next
}

/// The unit id at the end of an owner-index key.
fn unit_id_suffix(key: &[u8]) -> Result<UnitId, StoreError> {
    key.len()
        .checked_sub(32)
        .and_then(|at| key[at..].try_into().ok())
        .ok_or_else(|| StoreError::IndexCorruption {
            message: format!("malformed index key of {} bytes", key.len()),
        })
}
