//! # Projection Rules
//!
//! One handler per payload variant. Every handler works against the
//! transaction-scoped store view of the block being processed.

use shared_types::{
    AddFeeCreditAttributes, Bill, CloseFeeCreditAttributes, FeeCreditBill, FeeCreditBillRef, Hash,
    Proof, ReclaimFeeCreditAttributes, SplitAttributes, SwapDcAttributes, SystemDescriptionRecord,
    SystemId, TransactionRecord, TransferAttributes, TransferDcAttributes,
    TransferFeeCreditAttributes, TxHistoryKind, TxHistoryRecord, TxHistoryState, TxPayload, UnitId,
    ZERO_HASH,
};
use tracing::{debug, warn};
use wb_01_bill_store::{BillStoreRead, BillStoreTx};

use crate::domain::{BlockSummary, ProcessingError, ProcessorConfig};

/// Everything a handler needs to know about the transaction being applied.
pub(super) struct TxInput<'a> {
    pub config: &'a ProcessorConfig,
    pub sdrs: &'a [SystemDescriptionRecord],
    pub round: u64,
    pub record: &'a TransactionRecord,
    pub tx_hash: Hash,
    pub proof: Proof,
}

impl TxInput<'_> {
    fn unit_id(&self) -> UnitId {
        self.record.transaction_order.payload.unit_id
    }

    fn fee(&self) -> u64 {
        self.record.actual_fee()
    }
}

/// Apply one transaction record.
pub(super) fn apply_transaction(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    summary: &mut BlockSummary,
) -> Result<(), ProcessingError> {
    let order = &input.record.transaction_order;
    let payload = match TxPayload::decode(order) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                "[wb-02] Skipping malformed {} transaction {}: {}",
                order.payload_type(),
                hex::encode(input.tx_hash),
                e
            );
            summary.skipped_transactions += 1;
            return Ok(());
        }
    };

    if payload.is_fee_credit_paid() {
        charge_fee(tx, input)?;
    }

    match &payload {
        TxPayload::Transfer(attrs) => transfer(tx, input, attrs),
        TxPayload::TransferDc(attrs) => transfer_dc(tx, input, attrs),
        TxPayload::Split(attrs) => split(tx, input, attrs, summary),
        TxPayload::SwapDc(attrs) => swap_dc(tx, input, attrs),
        TxPayload::TransferFeeCredit(attrs) => transfer_fee_credit(tx, input, attrs),
        TxPayload::AddFeeCredit(attrs) => add_fee_credit(tx, input, attrs, summary),
        TxPayload::CloseFeeCredit(attrs) => close_fee_credit(tx, input, attrs),
        TxPayload::ReclaimFeeCredit(attrs) => reclaim_fee_credit(tx, input, attrs, summary),
        TxPayload::Unknown(payload_type) => {
            warn!(
                "[wb-02] Skipping unsupported transaction type {} ({})",
                payload_type,
                hex::encode(input.tx_hash)
            );
            summary.skipped_transactions += 1;
            Ok(())
        }
    }
}

// =============================================================================
// BILL TRANSACTIONS
// =============================================================================

fn transfer(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &TransferAttributes,
) -> Result<(), ProcessingError> {
    let unit_id = input.unit_id();
    let previous_owner = tx.get_bill(&unit_id)?.map(|b| b.owner_predicate);

    let bill = Bill::new(unit_id, attrs.target_value, input.tx_hash, attrs.new_bearer.clone());
    tx.set_bill(&bill, Some(&input.proof))?;

    if let Some(previous) = &previous_owner {
        record_history(tx, input, previous, TxHistoryKind::Outgoing, attrs.target_value, &attrs.new_bearer)?;
    }
    record_history(
        tx,
        input,
        &attrs.new_bearer,
        TxHistoryKind::Incoming,
        attrs.target_value,
        previous_owner.as_deref().unwrap_or(&[]),
    )
}

fn transfer_dc(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &TransferDcAttributes,
) -> Result<(), ProcessingError> {
    let unit_id = input.unit_id();
    let mut bill = Bill::new(unit_id, attrs.value, input.tx_hash, attrs.target_bearer.clone());
    bill.dc_target_unit_id = Some(attrs.target_unit_id);
    tx.set_bill(&bill, Some(&input.proof))?;

    let expires_at = input
        .round
        .saturating_add(input.config.dust_bill_deletion_timeout);
    tx.set_bill_expiration_time(expires_at, &unit_id)?;
    debug!(
        "[wb-02] Dust bill {} expires at round {}",
        hex::encode(unit_id),
        expires_at
    );
    Ok(())
}

fn split(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &SplitAttributes,
    summary: &mut BlockSummary,
) -> Result<(), ProcessingError> {
    let unit_id = input.unit_id();
    let source_owner = match tx.get_bill(&unit_id)? {
        Some(mut source) => {
            let owner = source.owner_predicate.clone();
            if attrs.remaining_value == 0 {
                tx.remove_bill(&unit_id)?;
            } else {
                source.value = attrs.remaining_value;
                source.tx_hash = input.tx_hash;
                tx.set_bill(&source, Some(&input.proof))?;
            }
            Some(owner)
        }
        None => {
            warn!(
                "[wb-02] Split source bill {} is not indexed (tx {})",
                hex::encode(unit_id),
                hex::encode(input.tx_hash)
            );
            summary.missing_split_sources += 1;
            None
        }
    };

    let new_id = shared_types::same_shard_id(&unit_id, &input.tx_hash);
    let new_bill = Bill::new(new_id, attrs.amount, input.tx_hash, attrs.target_bearer.clone());
    tx.set_bill(&new_bill, Some(&input.proof))?;

    if let Some(owner) = &source_owner {
        record_history(tx, input, owner, TxHistoryKind::Outgoing, attrs.amount, &attrs.target_bearer)?;
    }
    record_history(
        tx,
        input,
        &attrs.target_bearer,
        TxHistoryKind::Incoming,
        attrs.amount,
        source_owner.as_deref().unwrap_or(&[]),
    )
}

fn swap_dc(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &SwapDcAttributes,
) -> Result<(), ProcessingError> {
    let unit_id = input.unit_id();
    let bill = Bill::new(unit_id, attrs.target_value, input.tx_hash, attrs.owner_condition.clone());
    tx.set_bill(&bill, Some(&input.proof))?;

    for dust_id in attrs.bill_identifiers.iter().filter(|id| **id != unit_id) {
        tx.remove_bill(dust_id)?;
    }
    Ok(())
}

// =============================================================================
// FEE CREDIT TRANSACTIONS
// =============================================================================

fn transfer_fee_credit(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &TransferFeeCreditAttributes,
) -> Result<(), ProcessingError> {
    let unit_id = input.unit_id();
    let mut bill = tx
        .get_bill(&unit_id)?
        .ok_or(ProcessingError::MissingBill { id: unit_id })?;

    let debit = attrs
        .amount
        .checked_add(input.fee())
        .ok_or(ProcessingError::ValueOverflow { id: unit_id })?;
    let balance = bill.value;
    bill.value = balance
        .checked_sub(debit)
        .ok_or(ProcessingError::BillUnderflow {
            id: unit_id,
            balance,
            amount: debit,
        })?;
    bill.tx_hash = input.tx_hash;
    if bill.value == 0 {
        tx.remove_bill(&unit_id)?;
    } else {
        tx.set_bill(&bill, Some(&input.proof))?;
    }

    credit_fee_bill(tx, input, &attrs.target_system_identifier, attrs.amount)?;
    credit_fee_bill(tx, input, &input.config.system_id, input.fee())?;
    tx.set_locked_fee_credit(&attrs.target_system_identifier, &attrs.target_record_id, input.record)?;
    Ok(())
}

fn add_fee_credit(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &AddFeeCreditAttributes,
    summary: &mut BlockSummary,
) -> Result<(), ProcessingError> {
    let transfer = match TxPayload::decode(&attrs.fee_credit_transfer.transaction_order) {
        Ok(TxPayload::TransferFeeCredit(transfer)) => transfer,
        other => {
            warn!(
                "[wb-02] Skipping addFC {}: nested record is not a fee credit transfer ({:?})",
                hex::encode(input.tx_hash),
                other.err()
            );
            summary.skipped_transactions += 1;
            return Ok(());
        }
    };

    let fcb_id = input.unit_id();
    let fee = input.fee();
    let credit = transfer
        .amount
        .checked_sub(fee)
        .ok_or(ProcessingError::AmountBelowFees {
            amount: transfer.amount,
            fees: fee,
        })?;

    let previous = tx.get_fee_credit_bill(&fcb_id)?.map(|fcb| fcb.value).unwrap_or(0);
    let fcb = FeeCreditBill {
        id: fcb_id,
        value: previous
            .checked_add(credit)
            .ok_or(ProcessingError::ValueOverflow { id: fcb_id })?,
        tx_hash: input.tx_hash,
        fc_block_number: input.round,
        last_add_fc_tx_hash: Some(input.tx_hash),
    };
    tx.set_fee_credit_bill(&fcb, Some(&input.proof))?;
    Ok(())
}

fn close_fee_credit(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &CloseFeeCreditAttributes,
) -> Result<(), ProcessingError> {
    let fcb_id = input.unit_id();
    let mut fcb = tx
        .get_fee_credit_bill(&fcb_id)?
        .ok_or(ProcessingError::MissingFeeCreditBill { id: fcb_id })?;

    let balance = fcb.value;
    fcb.value = balance
        .checked_sub(attrs.amount)
        .ok_or(ProcessingError::InsufficientFeeCredit {
            id: fcb_id,
            balance,
            amount: attrs.amount,
        })?;
    fcb.tx_hash = input.tx_hash;
    fcb.fc_block_number = input.round;
    tx.set_fee_credit_bill(&fcb, Some(&input.proof))?;
    tx.set_closed_fee_credit(&fcb_id, input.record)?;
    Ok(())
}

fn reclaim_fee_credit(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    attrs: &ReclaimFeeCreditAttributes,
    summary: &mut BlockSummary,
) -> Result<(), ProcessingError> {
    let close_record = &attrs.close_fee_credit_transfer;
    let close = match TxPayload::decode(&close_record.transaction_order) {
        Ok(TxPayload::CloseFeeCredit(close)) => close,
        other => {
            warn!(
                "[wb-02] Skipping reclFC {}: nested record is not a fee credit close ({:?})",
                hex::encode(input.tx_hash),
                other.err()
            );
            summary.skipped_transactions += 1;
            return Ok(());
        }
    };

    let unit_id = input.unit_id();
    let close_fee = close_record.actual_fee();
    let reclaim_fee = input.fee();
    let fees = close_fee.saturating_add(reclaim_fee);
    let credit = close
        .amount
        .checked_sub(fees)
        .ok_or(ProcessingError::AmountBelowFees {
            amount: close.amount,
            fees,
        })?;

    let mut bill = tx
        .get_bill(&unit_id)?
        .ok_or(ProcessingError::MissingBill { id: unit_id })?;
    bill.value = bill
        .value
        .checked_add(credit)
        .ok_or(ProcessingError::ValueOverflow { id: unit_id })?;
    bill.tx_hash = input.tx_hash;
    tx.set_bill(&bill, Some(&input.proof))?;

    // The closing partition paid out everything but its own fee
    let close_system_id = *close_record.transaction_order.system_id();
    debit_fee_bill(tx, input, &close_system_id, close.amount - close_fee)?;
    credit_fee_bill(tx, input, &input.config.system_id, reclaim_fee)?;
    Ok(())
}

// =============================================================================
// FEES AND HISTORY
// =============================================================================

/// Debit the transaction's fee from the fee credit bill named in its metadata.
fn charge_fee(tx: &mut dyn BillStoreTx, input: &TxInput<'_>) -> Result<(), ProcessingError> {
    let fee = input.fee();
    if fee == 0 {
        return Ok(());
    }

    let fcb_id = *input
        .record
        .transaction_order
        .fee_credit_record_id()
        .ok_or(ProcessingError::MissingFeeCreditRecordId {
            tx_hash: input.tx_hash,
        })?;
    let mut fcb = tx
        .get_fee_credit_bill(&fcb_id)?
        .ok_or(ProcessingError::MissingFeeCreditBill { id: fcb_id })?;

    let balance = fcb.value;
    fcb.value = balance
        .checked_sub(fee)
        .ok_or(ProcessingError::InsufficientFeeCredit {
            id: fcb_id,
            balance,
            amount: fee,
        })?;
    fcb.tx_hash = input.tx_hash;
    fcb.fc_block_number = input.round;
    tx.set_fee_credit_bill(&fcb, Some(&input.proof))?;
    Ok(())
}

fn fee_bill_ref<'a>(
    sdrs: &'a [SystemDescriptionRecord],
    system_id: &SystemId,
) -> Result<&'a FeeCreditBillRef, ProcessingError> {
    sdrs.iter()
        .find(|sdr| sdr.system_identifier == *system_id)
        .map(|sdr| &sdr.fee_credit_bill)
        .ok_or(ProcessingError::UnknownPartition {
            system_id: *system_id,
        })
}

fn load_fee_bill(tx: &dyn BillStoreTx, fee_ref: &FeeCreditBillRef) -> Result<Bill, ProcessingError> {
    Ok(tx.get_bill(&fee_ref.unit_id)?.unwrap_or_else(|| {
        Bill::new(fee_ref.unit_id, 0, ZERO_HASH, fee_ref.owner_predicate.clone())
    }))
}

fn credit_fee_bill(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    system_id: &SystemId,
    amount: u64,
) -> Result<(), ProcessingError> {
    if amount == 0 {
        return Ok(());
    }
    let fee_ref = fee_bill_ref(input.sdrs, system_id)?;
    let mut bill = load_fee_bill(tx, fee_ref)?;
    bill.value = bill
        .value
        .checked_add(amount)
        .ok_or(ProcessingError::ValueOverflow { id: bill.id })?;
    bill.tx_hash = input.tx_hash;
    tx.set_bill(&bill, Some(&input.proof))?;
    Ok(())
}

fn debit_fee_bill(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    system_id: &SystemId,
    amount: u64,
) -> Result<(), ProcessingError> {
    if amount == 0 {
        return Ok(());
    }
    let fee_ref = fee_bill_ref(input.sdrs, system_id)?;
    let mut bill = load_fee_bill(tx, fee_ref)?;
    let balance = bill.value;
    bill.value = balance
        .checked_sub(amount)
        .ok_or(ProcessingError::BillUnderflow {
            id: bill.id,
            balance,
            amount,
        })?;
    bill.tx_hash = input.tx_hash;
    tx.set_bill(&bill, Some(&input.proof))?;
    Ok(())
}

fn record_history(
    tx: &mut dyn BillStoreTx,
    input: &TxInput<'_>,
    owner_predicate: &[u8],
    kind: TxHistoryKind,
    amount: u64,
    counterparty: &[u8],
) -> Result<(), ProcessingError> {
    let record = TxHistoryRecord {
        tx_hash: input.tx_hash,
        unit_id: input.unit_id(),
        kind,
        state: TxHistoryState::Confirmed,
        amount,
        counterparty: counterparty.to_vec(),
        block_number: Some(input.round),
    };
    tx.store_tx_history_record(owner_predicate, &record)?;
    Ok(())
}
