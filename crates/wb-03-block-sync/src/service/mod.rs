//! # Block Sync Service
//!
//! Pulls certified blocks from the node in batches and hands them to the
//! block processor in round order.
//!
//! ## Loop
//!
//! 1. Resume from `last indexed round + 1`. A store failure while reading
//!    it backs off like any other transient error.
//! 2. Fetch up to `batch_size` rounds and process every returned block on a
//!    blocking task.
//! 3. Advance the cursor past the whole batch, so empty rounds are skipped.
//! 4. When nothing new arrived, wait `poll_interval` and poll again.
//!
//! Transient failures back off exponentially; protocol violations stop the
//! loop so an operator can look at the store.


use std::sync::Arc;
use std::time::Duration;

use shared_types::NodeClient;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use wb_02_block_processor::BlockProcessorApi;

use crate::domain::{Backoff, SyncConfig, SyncError};

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    /// The cursor moved; fetch again immediately.
    Advanced(u64),
    /// The node had nothing new.
    CaughtUp,
    /// Shutdown was requested mid-batch.
    Stopped,
}

/// The block sync loop.
pub struct BlockSync {
    client: Arc<dyn NodeClient>,
    processor: Arc<dyn BlockProcessorApi>,
    config: SyncConfig,
}

impl BlockSync {
    pub fn new(
        client: Arc<dyn NodeClient>,
        processor: Arc<dyn BlockProcessorApi>,
        config: SyncConfig,
    ) -> Self {
        Self {
            client,
            processor,
            config,
        }
    }

    /// Run until `shutdown` flips to `true` or a fatal error occurs.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), SyncError> {
        let mut backoff = Backoff::new(&self.config);
        // 0 until the resume point has been read from the store
        let mut cursor = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let step = if cursor == 0 {
                self.resume_round().map(Progress::Advanced)
            } else {
                self.sync_batch(cursor, &shutdown).await
            };
            let delay = match step {
                Ok(Progress::Advanced(next)) => {
                    backoff.reset();
                    cursor = next;
                    continue;
                }
                Ok(Progress::CaughtUp) => {
                    backoff.reset();
                    self.config.poll_interval
                }
                Ok(Progress::Stopped) => break,
                Err(e) if e.is_fatal() => {
                    error!("[wb-03] Block sync stopped at round {}: {}", cursor, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        "[wb-03] Sync of round {} failed, retrying in {:?}: {}",
                        cursor, delay, e
                    );
                    delay
                }
            };

            if wait_or_shutdown(delay, &mut shutdown).await {
                break;
            }
        }

        info!("[wb-03] Block sync stopped at round {}", cursor);
        Ok(())
    }

    /// First round to fetch: one past the last indexed round.
    fn resume_round(&self) -> Result<u64, SyncError> {
        let round = self.processor.last_indexed_round()?.saturating_add(1);
        info!("[wb-03] Block sync starting at round {}", round);
        Ok(round)
    }

    async fn sync_batch(
        &self,
        cursor: u64,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<Progress, SyncError> {
        let stored = self.processor.last_indexed_round()?;
        let from = cursor.max(stored + 1);

        let batch = self.client.get_blocks(from, self.config.batch_size).await?;
        let mut next = from;
        for block in batch.blocks {
            if *shutdown.borrow() {
                return Ok(Progress::Stopped);
            }
            let round = block.round_number;
            if round < next {
                debug!("[wb-03] Skipping already indexed round {}", round);
                continue;
            }

            let processor = Arc::clone(&self.processor);
            tokio::task::spawn_blocking(move || processor.process_block(&block))
                .await
                .map_err(|e| SyncError::Task(e.to_string()))??;
            next = round + 1;
        }

        next = next.max(batch.max_round_number.saturating_add(1));
        if next > from {
            Ok(Progress::Advanced(next))
        } else {
            Ok(Progress::CaughtUp)
        }
    }
}

/// Sleep for `delay`; returns `true` if shutdown was requested meanwhile.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sender_gone = tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err(),
    };
    sender_gone || *shutdown.borrow()
}
