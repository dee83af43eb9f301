//! The periodic gap-discovery task.

use indexer_storage::{gaps, Pool, StorageResult};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Scans the header index on a fixed cadence and materialises missing or under-validated
/// ranges as rows in the gaps queue.
#[derive(Debug)]
pub struct GapFinder {
    pool: Pool,
    start_block: u64,
    validation_threshold: i32,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl GapFinder {
    /// Creates the finder.
    ///
    /// `start_block` is the lower bound of history this deployment cares about: heights below
    /// the first indexed header are only queued down to it.
    pub const fn new(
        pool: Pool,
        start_block: u64,
        validation_threshold: i32,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { pool, start_block, validation_threshold, interval, shutdown }
    }

    /// Runs scans on the configured cadence until shutdown.
    pub async fn run(mut self) {
        info!(
            target: "indexer::gaps",
            interval_secs = self.interval.as_secs(),
            "starting gap finder"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => return,
                _ = ticker.tick() => {
                    if let Err(err) = self.find_gaps().await {
                        warn!(target: "indexer::gaps", %err, "gap scan failed");
                    }
                }
            }
        }
    }

    /// One full scan: the leading-range seed, the empty-range scan and the
    /// validation-deficit scan.
    pub async fn find_gaps(&self) -> StorageResult<()> {
        let client = self.pool.get().await?;

        // Blocks before the first indexed header are invisible to the pairwise scan; queue
        // them down to the configured start explicitly.
        if let Some(min) = gaps::min_indexed_block(&client).await? {
            let start = self.start_block as i64;
            if min > start {
                gaps::insert_gap(&client, start, min - 1, false).await?;
            }
        }

        let inserted = gaps::insert_empty_ranges(&client).await?;
        if inserted > 0 {
            info!(target: "indexer::gaps", inserted, "found missing block ranges");
        }

        let deficit = gaps::validation_deficit_blocks(&client, self.validation_threshold).await?;
        for block_number in deficit {
            if gaps::insert_gap(&client, block_number, block_number, true).await? {
                debug!(target: "indexer::gaps", block_number, "queued block for revalidation");
            }
        }

        let queued = gaps::gap_count(&client).await?;
        metrics::gauge!("indexer_gaps_queued").set(queued as f64);
        Ok(())
    }
}
