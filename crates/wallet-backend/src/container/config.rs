//! # Backend Configuration
//!
//! Unified configuration for every wallet-backend component.
//!
//! ## Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `WB_SERVER_ADDR` | `127.0.0.1:9654` |
//! | `WB_NODE_URL` | `http://127.0.0.1:26866` |
//! | `WB_NODE_TIMEOUT_MS` | `10000` |
//! | `WB_DB_PATH` | `./wallet-backend-data` |
//! | `WB_IN_MEMORY` | `false` |
//! | `WB_BATCH_SIZE` | `100` |
//! | `WB_POLL_INTERVAL_MS` | `1000` |
//! | `WB_MAX_BACKOFF_MS` | `30000` |
//! | `WB_DUST_TIMEOUT` | `65536` rounds |
//! | `WB_LIST_BILLS_LIMIT` | `100` |
//! | `WB_SYSTEM_ID` | `0x00000000` |
//! | `WB_INITIAL_BILL_ID` | `0x00..01` |
//! | `WB_INITIAL_BILL_VALUE` | `0` (not indexed) |
//! | `WB_INITIAL_BILL_OWNER` | always-true predicate |
//! | `WB_FEE_BILL_ID` | `0x00..02` |
//! | `WB_FEE_BILL_OWNER` | always-true predicate |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use shared_types::{decode_hex, decode_hex_fixed, DecodeError, SystemId, UnitId, MONEY_SYSTEM_ID};
use thiserror::Error;
use wb_01_bill_store::MAX_PAGE_LIMIT;
use wb_02_block_processor::{ProcessorConfig, DEFAULT_DUST_BILL_DELETION_TIMEOUT};
use wb_03_block_sync::SyncConfig;
use wb_04_rest_api::RestConfig;

use crate::genesis::ALWAYS_TRUE_PREDICATE;

/// Complete backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// REST server configuration.
    pub server: ServerConfig,
    /// Partition node connection.
    pub node: NodeConfig,
    /// Bill store location.
    pub storage: StorageConfig,
    /// Block sync loop tuning.
    pub sync: SyncSettings,
    /// Indexed partition and genesis contents.
    pub chain: ChainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Page size for `list-bills` and `tx-history` when the request has none.
    pub list_bills_limit: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9654)),
            list_bills_limit: MAX_PAGE_LIMIT,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Base URL of the node's REST interface.
    pub url: String,
    pub request_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:26866".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    /// Keep everything in memory; the index is rebuilt from round 1 on restart.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./wallet-backend-data"),
            in_memory: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub batch_size: u64,
    pub poll_interval: Duration,
    pub max_backoff: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        Self {
            batch_size: defaults.batch_size,
            poll_interval: defaults.poll_interval,
            max_backoff: defaults.max_backoff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub system_id: SystemId,
    pub dust_bill_deletion_timeout: u64,
    pub initial_bill_id: UnitId,
    /// Zero leaves the initial bill out of the index.
    pub initial_bill_value: u64,
    pub initial_bill_owner: Vec<u8>,
    /// Unit id of the money partition fee bill.
    pub fee_bill_id: UnitId,
    pub fee_bill_owner: Vec<u8>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            system_id: MONEY_SYSTEM_ID,
            dust_bill_deletion_timeout: DEFAULT_DUST_BILL_DELETION_TIMEOUT,
            initial_bill_id: unit_id_from_u8(1),
            initial_bill_value: 0,
            initial_bill_owner: ALWAYS_TRUE_PREDICATE.to_vec(),
            fee_bill_id: unit_id_from_u8(2),
            fee_bill_owner: ALWAYS_TRUE_PREDICATE.to_vec(),
        }
    }
}

fn unit_id_from_u8(n: u8) -> UnitId {
    let mut id = [0u8; 32];
    id[31] = n;
    id
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("initial bill and fee bill must have different unit ids")]
    ConflictingUnitIds,

    #[error(transparent)]
    Rest(#[from] wb_04_rest_api::RestConfigError),
}

impl BackendConfig {
    /// Defaults overridden by `WB_*` variables from `lookup`.
    pub fn from_env_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = EnvReader { lookup };

        if let Some(addr) = env.parsed::<SocketAddr>("WB_SERVER_ADDR")? {
            config.server.listen_addr = addr;
        }
        if let Some(limit) = env.parsed::<usize>("WB_LIST_BILLS_LIMIT")? {
            config.server.list_bills_limit = limit;
        }
        if let Some(url) = env.string("WB_NODE_URL") {
            config.node.url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = env.parsed::<u64>("WB_NODE_TIMEOUT_MS")? {
            config.node.request_timeout = Duration::from_millis(ms);
        }
        if let Some(path) = env.string("WB_DB_PATH") {
            config.storage.db_path = PathBuf::from(path);
        }
        if let Some(in_memory) = env.parsed::<bool>("WB_IN_MEMORY")? {
            config.storage.in_memory = in_memory;
        }
        if let Some(batch_size) = env.parsed::<u64>("WB_BATCH_SIZE")? {
            config.sync.batch_size = batch_size;
        }
        if let Some(ms) = env.parsed::<u64>("WB_POLL_INTERVAL_MS")? {
            config.sync.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parsed::<u64>("WB_MAX_BACKOFF_MS")? {
            config.sync.max_backoff = Duration::from_millis(ms);
        }
        if let Some(timeout) = env.parsed::<u64>("WB_DUST_TIMEOUT")? {
            config.chain.dust_bill_deletion_timeout = timeout;
        }
        if let Some(id) = env.string("WB_SYSTEM_ID") {
            config.chain.system_id = decode_hex_fixed("WB_SYSTEM_ID", &id).map_err(invalid("WB_SYSTEM_ID"))?;
        }
        if let Some(id) = env.string("WB_INITIAL_BILL_ID") {
            config.chain.initial_bill_id =
                decode_hex_fixed("WB_INITIAL_BILL_ID", &id).map_err(invalid("WB_INITIAL_BILL_ID"))?;
        }
        if let Some(value) = env.parsed::<u64>("WB_INITIAL_BILL_VALUE")? {
            config.chain.initial_bill_value = value;
        }
        if let Some(owner) = env.string("WB_INITIAL_BILL_OWNER") {
            config.chain.initial_bill_owner =
                decode_hex("WB_INITIAL_BILL_OWNER", &owner).map_err(invalid("WB_INITIAL_BILL_OWNER"))?;
        }
        if let Some(id) = env.string("WB_FEE_BILL_ID") {
            config.chain.fee_bill_id = decode_hex_fixed("WB_FEE_BILL_ID", &id).map_err(invalid("WB_FEE_BILL_ID"))?;
        }
        if let Some(owner) = env.string("WB_FEE_BILL_OWNER") {
            config.chain.fee_bill_owner =
                decode_hex("WB_FEE_BILL_OWNER", &owner).map_err(invalid("WB_FEE_BILL_OWNER"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the components would refuse at start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.batch_size == 0 {
            return Err(ConfigError::NotPositive("WB_BATCH_SIZE"));
        }
        if self.sync.poll_interval.is_zero() {
            return Err(ConfigError::NotPositive("WB_POLL_INTERVAL_MS"));
        }
        if self.node.request_timeout.is_zero() {
            return Err(ConfigError::NotPositive("WB_NODE_TIMEOUT_MS"));
        }
        if self.chain.initial_bill_value > 0 && self.chain.initial_bill_id == self.chain.fee_bill_id {
            return Err(ConfigError::ConflictingUnitIds);
        }
        self.rest_config().validate()?;
        Ok(())
    }

    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            system_id: self.chain.system_id,
            default_limit: self.server.list_bills_limit,
            max_body_bytes: self.server.max_body_bytes,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            batch_size: self.sync.batch_size,
            poll_interval: self.sync.poll_interval,
            max_backoff: self.sync.max_backoff,
            ..SyncConfig::default()
        }
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            system_id: self.chain.system_id,
            dust_bill_deletion_timeout: self.chain.dust_bill_deletion_timeout,
        }
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(name)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                    name,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

fn invalid(name: &'static str) -> impl Fn(DecodeError) -> ConfigError {
    move |e| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    }
}
