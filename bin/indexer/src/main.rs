//! Entrypoint wiring the three concurrent roles together: the live tail, the gap finder and
//! the backfill dispatcher pool, all driving one transform pipeline over one connection pool.

mod cli;

use clap::Parser;
use cli::Cli;
use indexer_client::StateDiffClient;
use indexer_historical::{BackfillService, GapFinder};
use indexer_storage::gaps;
use indexer_transform::{HeadFollower, StateDiffTransformer};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{info, warn};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run_until_shutdown(cli))
}

async fn run_until_shutdown(cli: Cli) -> eyre::Result<()> {
    let chain_spec = cli.chain_spec();
    let pool = indexer_storage::new_pool(&cli.database_url, cli.db_pool_size)?;
    let client = Arc::new(StateDiffClient::new(&cli.http_url, &cli.ws_url)?);
    let transformer = Arc::new(StateDiffTransformer::new(chain_spec, pool.clone()));

    // Fail fast on an unreachable or unmigrated store before spawning anything.
    let bootstrap = pool.get().await?;
    seed_initial_range(&bootstrap, &cli).await?;
    drop(bootstrap);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = Vec::new();

    let head = HeadFollower::new(
        Arc::clone(&transformer),
        Arc::clone(&client),
        cli.end_block,
        shutdown_rx.clone(),
    );
    tasks.push(tokio::spawn(head.run()));

    let finder = GapFinder::new(
        pool.clone(),
        cli.start_block,
        cli.validation_threshold,
        Duration::from_secs(cli.gap_check_interval),
        shutdown_rx.clone(),
    );
    tasks.push(tokio::spawn(finder.run()));

    let backfill = BackfillService::new(
        pool,
        client,
        transformer,
        cli.backfill_workers,
        cli.bad_block_attempts,
        shutdown_rx,
    );
    tasks.extend(backfill.spawn());

    info!(
        target: "indexer",
        workers = cli.backfill_workers,
        start_block = cli.start_block,
        end_block = cli.end_block,
        "indexer started"
    );

    tokio::signal::ctrl_c().await?;
    info!(target: "indexer", "shutting down");
    let _ = shutdown_tx.send(true);

    for task in tasks {
        if let Err(err) = task.await {
            warn!(target: "indexer", %err, "task ended abnormally");
        }
    }

    Ok(())
}

/// Queues the configured `[start_block, end_block]` range once, so a fresh deployment with a
/// bounded target starts backfilling before the first head payload lands.
async fn seed_initial_range(
    client: &indexer_storage::PoolClient,
    cli: &Cli,
) -> eyre::Result<()> {
    if cli.end_block == 0 || cli.end_block < cli.start_block {
        return Ok(())
    }
    if gaps::min_indexed_block(client).await?.is_none() {
        let inserted =
            gaps::insert_gap(client, cli.start_block as i64, cli.end_block as i64, false).await?;
        if inserted {
            info!(
                target: "indexer",
                start_block = cli.start_block,
                end_block = cli.end_block,
                "queued initial backfill range"
            );
        }
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
