//! # Processor Metrics
//!
//! Counters updated after each committed block.

use std::sync::atomic::{AtomicU64, Ordering};

/// What one committed block did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub round_number: u64,
    pub transactions: u64,
    /// Unknown or malformed transactions that were logged and skipped.
    pub skipped_transactions: u64,
    /// Splits whose source bill was not indexed.
    pub missing_split_sources: u64,
    pub expired_bills_removed: u64,
}

/// Cumulative processor counters.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    pub blocks_processed: AtomicU64,
    pub transactions_processed: AtomicU64,
    pub skipped_transactions: AtomicU64,
    pub missing_split_sources: AtomicU64,
    pub expired_bills_removed: AtomicU64,
    pub last_round_number: AtomicU64,
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed block
    pub fn record_block(&self, summary: &BlockSummary) {
        self.blocks_processed.fetch_add(1, Ordering::Relaxed);
        self.transactions_processed
            .fetch_add(summary.transactions, Ordering::Relaxed);
        self.skipped_transactions
            .fetch_add(summary.skipped_transactions, Ordering::Relaxed);
        self.missing_split_sources
            .fetch_add(summary.missing_split_sources, Ordering::Relaxed);
        self.expired_bills_removed
            .fetch_add(summary.expired_bills_removed, Ordering::Relaxed);
        self.last_round_number
            .store(summary.round_number, Ordering::Relaxed);
    }

    pub fn missing_split_sources(&self) -> u64 {
        self.missing_split_sources.load(Ordering::Relaxed)
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_block_accumulates() {
        let metrics = ProcessorMetrics::new();
        let summary = BlockSummary {
            round_number: 4,
            transactions: 3,
            skipped_transactions: 1,
            missing_split_sources: 1,
            expired_bills_removed: 2,
        };
        metrics.record_block(&summary);
        metrics.record_block(&BlockSummary {
            round_number: 5,
            ..summary
        });

        assert_eq!(metrics.blocks_processed(), 2);
        assert_eq!(metrics.missing_split_sources(), 2);
        assert_eq!(metrics.last_round_number.load(Ordering::Relaxed), 5);
    }
}
