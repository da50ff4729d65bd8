//! # Processing Errors
//!
//! Two classes: protocol violations, which halt indexing until an operator
//! steps in, and store failures, which the sync loop retries.

use shared_types::{DecodeError, Hash, SystemId, UnitId};
use thiserror::Error;
use wb_01_bill_store::StoreError;

/// Errors that abort processing of a block.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Block round is not above the last indexed round.
    #[error("block round {received} is not above last indexed round {stored}")]
    NonMonotonicRound { stored: u64, received: u64 },

    /// Block belongs to another partition.
    #[error("block system id {} does not match configured {}", hex::encode(.actual), hex::encode(.expected))]
    SystemIdMismatch { expected: SystemId, actual: SystemId },

    /// A fee was charged but no fee credit record was named.
    #[error("transaction {} charges a fee without a fee credit record", hex::encode(.tx_hash))]
    MissingFeeCreditRecordId { tx_hash: Hash },

    /// The named fee credit bill is not indexed.
    #[error("fee credit bill {} not found", hex::encode(.id))]
    MissingFeeCreditBill { id: UnitId },

    /// Fee credit bill cannot cover a debit.
    #[error("fee credit bill {} has {balance}, cannot debit {amount}", hex::encode(.id))]
    InsufficientFeeCredit { id: UnitId, balance: u64, amount: u64 },

    /// A bill the transaction spends is not indexed.
    #[error("bill {} not found", hex::encode(.id))]
    MissingBill { id: UnitId },

    /// A bill (ordinary or partition fee bill) would go negative.
    #[error("bill {} has {balance}, cannot debit {amount}", hex::encode(.id))]
    BillUnderflow { id: UnitId, balance: u64, amount: u64 },

    /// A fee credit amount does not cover the fees taken from it.
    #[error("amount {amount} does not cover fees {fees}")]
    AmountBelowFees { amount: u64, fees: u64 },

    /// A balance would exceed `u64::MAX`.
    #[error("value overflow on unit {}", hex::encode(.id))]
    ValueOverflow { id: UnitId },

    /// No system description record for the partition.
    #[error("unknown partition {}", hex::encode(.system_id))]
    UnknownPartition { system_id: SystemId },

    /// Block content could not be hashed.
    #[error("encoding error: {0}")]
    Encoding(#[from] DecodeError),

    /// Store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ProcessingError {
    /// Whether indexing must stop until an operator intervenes.
    ///
    /// Store failures are transient and may be retried.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProcessingError::Store(_))
    }
}
