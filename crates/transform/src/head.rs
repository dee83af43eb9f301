//! Live-tail ingestion: one task following the node's head-payload subscription.

use crate::StateDiffTransformer;
use futures_util::StreamExt;
use indexer_client::PayloadClient;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Follows the upstream head subscription and feeds every delivered payload through the
/// transformer, reconnecting with backoff when the stream drops.
#[derive(Debug)]
pub struct HeadFollower<C> {
    transformer: Arc<StateDiffTransformer>,
    client: Arc<C>,
    end_block: u64,
    shutdown: watch::Receiver<bool>,
}

impl<C: PayloadClient> HeadFollower<C> {
    /// Creates the follower. `end_block = 0` follows the head indefinitely; any other value
    /// stops the tail once a payload at or past it has been ingested.
    pub const fn new(
        transformer: Arc<StateDiffTransformer>,
        client: Arc<C>,
        end_block: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { transformer, client, end_block, shutdown }
    }

    /// Runs until shutdown, the configured end block, or a permanently failed subscription.
    pub async fn run(mut self) {
        // The live tail is worker 0; backfill dispatchers count from 1.
        const WORKER_ID: usize = 0;

        let mut backoff = INITIAL_BACKOFF;
        loop {
            if *self.shutdown.borrow() {
                return
            }

            let mut stream = match self.client.subscribe_payloads().await {
                Ok(stream) => {
                    info!(target: "indexer::head", "subscribed to head payloads");
                    backoff = INITIAL_BACKOFF;
                    stream
                }
                Err(err) => {
                    warn!(target: "indexer::head", %err, "head subscription failed");
                    if sleep_or_shutdown(&mut self.shutdown, backoff).await {
                        return
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue
                }
            };

            loop {
                tokio::select! {
                    _ = self.shutdown.changed() => return,
                    item = stream.next() => match item {
                        Some(Ok(payload)) => {
                            match self.transformer.transform(WORKER_ID, &payload).await {
                                Ok(block_number) => {
                                    if self.end_block != 0 && block_number >= self.end_block {
                                        info!(
                                            target: "indexer::head",
                                            block_number,
                                            end_block = self.end_block,
                                            "reached end block, stopping live tail"
                                        );
                                        return
                                    }
                                }
                                Err(err) => {
                                    // The gap finder re-queues anything the tail drops.
                                    error!(
                                        target: "indexer::head",
                                        %err,
                                        "failed to transform head payload"
                                    );
                                }
                            }
                        }
                        Some(Err(err)) => {
                            warn!(target: "indexer::head", %err, "bad subscription item");
                        }
                        None => break,
                    }
                }
            }

            warn!(target: "indexer::head", "head subscription ended, resubscribing");
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
