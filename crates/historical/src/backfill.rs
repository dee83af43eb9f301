//! The backfill dispatcher pool.
//!
//! Each worker loops over the gaps queue: reserve one range atomically, fetch and transform
//! every block in it, and retire the row only when the whole range succeeded. Transient
//! failures release the reservation for a later retry; a block whose payload is persistently
//! bad is skipped after a bounded number of attempts and the remainder of its range re-queued,
//! so one poisoned block cannot wedge the queue.

use indexer_client::PayloadClient;
use indexer_storage::{gaps, models::Gap, Pool, PoolClient};
use indexer_transform::StateDiffTransformer;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// How long an idle worker waits before polling the queue again.
const IDLE_SLEEP: Duration = Duration::from_secs(5);

/// What became of a reserved gap.
enum GapOutcome {
    /// Every block in the range was ingested.
    Completed,
    /// A transient failure; the reservation should be returned untouched.
    Released,
    /// A poisoned block was skipped; the rest of the range must be re-queued.
    Split {
        /// First block of the remainder to re-queue.
        resume_at: i64,
    },
    /// Shutdown fired mid-range.
    Cancelled,
}

/// A fixed pool of backfill workers draining the gaps queue.
#[derive(Debug)]
pub struct BackfillService<C> {
    pool: Pool,
    client: Arc<C>,
    transformer: Arc<StateDiffTransformer>,
    workers: usize,
    bad_block_attempts: usize,
    shutdown: watch::Receiver<bool>,
}

impl<C: PayloadClient + 'static> BackfillService<C> {
    /// Creates the service; nothing runs until [`Self::spawn`].
    pub const fn new(
        pool: Pool,
        client: Arc<C>,
        transformer: Arc<StateDiffTransformer>,
        workers: usize,
        bad_block_attempts: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { pool, client, transformer, workers, bad_block_attempts, shutdown }
    }

    /// Spawns the worker tasks. Worker ids start at 1; the live tail is worker 0.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        (1..=self.workers)
            .map(|worker_id| {
                let worker = Worker {
                    worker_id,
                    pool: self.pool.clone(),
                    client: Arc::clone(&self.client),
                    transformer: Arc::clone(&self.transformer),
                    bad_block_attempts: self.bad_block_attempts,
                    shutdown: self.shutdown.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect()
    }
}

struct Worker<C> {
    worker_id: usize,
    pool: Pool,
    client: Arc<C>,
    transformer: Arc<StateDiffTransformer>,
    bad_block_attempts: usize,
    shutdown: watch::Receiver<bool>,
}

impl<C: PayloadClient> Worker<C> {
    async fn run(mut self) {
        info!(target: "indexer::backfill", worker_id = self.worker_id, "starting worker");
        loop {
            if *self.shutdown.borrow() {
                return
            }

            let client = match self.pool.get().await {
                Ok(client) => client,
                Err(err) => {
                    warn!(
                        target: "indexer::backfill",
                        worker_id = self.worker_id,
                        %err,
                        "no database connection available"
                    );
                    if sleep_or_shutdown(&mut self.shutdown, IDLE_SLEEP).await {
                        return
                    }
                    continue
                }
            };

            let gap = match gaps::reserve_gap(&client).await {
                Ok(Some(gap)) => gap,
                Ok(None) => {
                    drop(client);
                    if sleep_or_shutdown(&mut self.shutdown, IDLE_SLEEP).await {
                        return
                    }
                    continue
                }
                Err(err) => {
                    warn!(
                        target: "indexer::backfill",
                        worker_id = self.worker_id,
                        %err,
                        "gap reservation failed"
                    );
                    if sleep_or_shutdown(&mut self.shutdown, IDLE_SLEEP).await {
                        return
                    }
                    continue
                }
            };

            debug!(
                target: "indexer::backfill",
                worker_id = self.worker_id,
                start = gap.start,
                stop = gap.stop,
                validation = gap.validation,
                "reserved gap"
            );

            match self.process_gap(&gap).await {
                GapOutcome::Completed => {
                    if let Err(err) = gaps::delete_gap(&client, gap.id).await {
                        warn!(
                            target: "indexer::backfill",
                            worker_id = self.worker_id,
                            %err,
                            "failed to retire completed gap"
                        );
                    } else {
                        metrics::counter!("indexer_gaps_completed").increment(1);
                    }
                }
                GapOutcome::Released => {
                    self.release(&client, gap.id).await;
                }
                GapOutcome::Split { resume_at } => {
                    if let Err(err) = gaps::delete_gap(&client, gap.id).await {
                        warn!(
                            target: "indexer::backfill",
                            worker_id = self.worker_id,
                            %err,
                            "failed to retire split gap"
                        );
                    } else if resume_at <= gap.stop {
                        if let Err(err) =
                            gaps::insert_gap(&client, resume_at, gap.stop, gap.validation).await
                        {
                            warn!(
                                target: "indexer::backfill",
                                worker_id = self.worker_id,
                                %err,
                                "failed to re-queue remainder of split gap"
                            );
                        }
                    }
                }
                GapOutcome::Cancelled => {
                    // Cancellation releases the reservation so a later run can retry.
                    self.release(&client, gap.id).await;
                    return
                }
            }
        }
    }

    /// Fetches and transforms every block in the reserved range.
    async fn process_gap(&self, gap: &Gap) -> GapOutcome {
        for block_number in gap.start..=gap.stop {
            if *self.shutdown.borrow() {
                return GapOutcome::Cancelled
            }

            let mut attempt = 0;
            loop {
                attempt += 1;

                let payload = match self.client.payload_at(block_number as u64).await {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(
                            target: "indexer::backfill",
                            worker_id = self.worker_id,
                            block_number,
                            %err,
                            "payload fetch failed, releasing gap"
                        );
                        return GapOutcome::Released
                    }
                };

                match self.transformer.transform(self.worker_id, &payload).await {
                    Ok(_) => break,
                    Err(err) if err.is_payload_fault() => {
                        if attempt >= self.bad_block_attempts {
                            error!(
                                target: "indexer::backfill",
                                worker_id = self.worker_id,
                                block_number,
                                attempts = attempt,
                                %err,
                                "skipping bad block, splitting gap"
                            );
                            metrics::counter!("indexer_blocks_skipped").increment(1);
                            return GapOutcome::Split { resume_at: block_number + 1 }
                        }
                        warn!(
                            target: "indexer::backfill",
                            worker_id = self.worker_id,
                            block_number,
                            attempt,
                            %err,
                            "bad payload, retrying"
                        );
                    }
                    Err(err) => {
                        warn!(
                            target: "indexer::backfill",
                            worker_id = self.worker_id,
                            block_number,
                            %err,
                            "transform failed, releasing gap"
                        );
                        return GapOutcome::Released
                    }
                }
            }
        }
        GapOutcome::Completed
    }

    async fn release(&self, client: &PoolClient, gap_id: i64) {
        if let Err(err) = gaps::release_gap(client, gap_id).await {
            warn!(
                target: "indexer::backfill",
                worker_id = self.worker_id,
                %err,
                "failed to release gap reservation"
            );
        }
    }
}

/// Sleeps for `period`, returning early with `true` if shutdown fires first.
async fn sleep_or_shutdown(shutdown: &mut watch::Receiver<bool>, period: Duration) -> bool {
    tokio::select! {
        _ = shutdown.changed() => true,
        _ = tokio::time::sleep(period) => false,
    }
}
