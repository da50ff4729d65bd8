//! # REST Configuration

use shared_types::{SystemId, MONEY_SYSTEM_ID};
use thiserror::Error;
use wb_01_bill_store::MAX_PAGE_LIMIT;

/// REST service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Partition reported by `/api/v1/info`.
    pub system_id: SystemId,
    /// Page size when a request omits `limit`.
    pub default_limit: usize,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            system_id: MONEY_SYSTEM_ID,
            default_limit: MAX_PAGE_LIMIT,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Invalid REST configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestConfigError {
    #[error("default page limit must be between 1 and {max}, got {actual}")]
    InvalidDefaultLimit { max: usize, actual: usize },

    #[error("request body limit must be positive")]
    ZeroBodyLimit,
}

impl RestConfig {
    pub fn validate(&self) -> Result<(), RestConfigError> {
        if self.default_limit == 0 || self.default_limit > MAX_PAGE_LIMIT {
            return Err(RestConfigError::InvalidDefaultLimit {
                max: MAX_PAGE_LIMIT,
                actual: self.default_limit,
            });
        }
        if self.max_body_bytes == 0 {
            return Err(RestConfigError::ZeroBodyLimit);
        }
        Ok(())
    }
}
