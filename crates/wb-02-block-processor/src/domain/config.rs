//! # Processor Configuration

use shared_types::{SystemId, MONEY_SYSTEM_ID};

/// Rounds a dust bill may wait for its swap before it is deleted.
pub const DEFAULT_DUST_BILL_DELETION_TIMEOUT: u64 = 65_536;

/// Block processor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Partition whose blocks are indexed.
    pub system_id: SystemId,
    /// Expiration delay for dust bills, in rounds.
    pub dust_bill_deletion_timeout: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            system_id: MONEY_SYSTEM_ID,
            dust_bill_deletion_timeout: DEFAULT_DUST_BILL_DELETION_TIMEOUT,
        }
    }
}
