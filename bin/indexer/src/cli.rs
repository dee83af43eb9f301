use clap::Parser;
use indexer_primitives::{ChainSpec, MAINNET};

/// Ingests Ethereum state-diff payloads into a content-addressed IPLD index backed by
/// Postgres, and keeps that index gap-free.
#[derive(Debug, Parser)]
#[command(name = "eth-ipld-indexer", version)]
pub struct Cli {
    /// HTTP endpoint of the state-diff enabled node.
    #[arg(long, env = "INDEXER_HTTP_URL", default_value = "http://127.0.0.1:8545")]
    pub http_url: String,

    /// WebSocket endpoint used for the head-payload subscription.
    #[arg(long, env = "INDEXER_WS_URL", default_value = "ws://127.0.0.1:8546")]
    pub ws_url: String,

    /// Postgres connection string for the index.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Chain id. Mainnet (1) selects the full fork schedule; any other chain is assumed to
    /// have launched with every relevant fork active.
    #[arg(long, default_value_t = 1)]
    pub chain_id: u64,

    /// First block of history to index.
    #[arg(long, default_value_t = 0)]
    pub start_block: u64,

    /// Last block to index. 0 follows the chain head indefinitely.
    #[arg(long, default_value_t = 0)]
    pub end_block: u64,

    /// How many times a block must be ingested before it is exempt from revalidation.
    #[arg(long, default_value_t = 1)]
    pub validation_threshold: i32,

    /// Size of the backfill dispatcher pool.
    #[arg(long, default_value_t = 4)]
    pub backfill_workers: usize,

    /// Seconds between gap-finder scans.
    #[arg(long, default_value_t = 60)]
    pub gap_check_interval: u64,

    /// Fetch attempts for a block whose payload repeatedly fails to transform before the
    /// block is skipped and its range split.
    #[arg(long, default_value_t = 3)]
    pub bad_block_attempts: usize,

    /// Maximum size of the shared Postgres connection pool.
    #[arg(long, default_value_t = 16)]
    pub db_pool_size: usize,
}

impl Cli {
    /// The fork schedule the configured chain runs.
    pub fn chain_spec(&self) -> ChainSpec {
        if self.chain_id == MAINNET.chain_id {
            MAINNET
        } else {
            ChainSpec::all_forks_active(self.chain_id)
        }
    }
}
