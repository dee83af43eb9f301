//! The gaps work queue.
//!
//! `eth.gaps` is the sole coordination surface between the gap finder and the backfill
//! dispatchers. The finder inserts ranges behind a `UNIQUE (start, stop)` constraint;
//! dispatchers claim them with a single atomic `FOR UPDATE SKIP LOCKED` reservation, so no
//! two workers ever observe the same available gap.

use crate::{models::Gap, StorageResult};
use tokio_postgres::Client;

/// Inserts a gap covering `[start, stop]` unless an identical range is already queued.
///
/// Returns whether a row was inserted.
pub async fn insert_gap(
    client: &Client,
    start: i64,
    stop: i64,
    validation: bool,
) -> StorageResult<bool> {
    let inserted = client
        .execute(
            "INSERT INTO eth.gaps (start, stop, validation) VALUES ($1, $2, $3) \
             ON CONFLICT (start, stop) DO NOTHING",
            &[&start, &stop, &validation],
        )
        .await?;
    Ok(inserted > 0)
}

/// Materialises every numeric discontinuity between indexed headers as a gap row.
///
/// For each pair of indexed heights `(r, s)` with nothing strictly between them, a row
/// `(r + 1, s - 1)` is inserted; duplicate ranges are silently skipped. Returns the number of
/// ranges inserted, so re-running against an unchanged index returns zero.
pub async fn insert_empty_ranges(client: &Client) -> StorageResult<u64> {
    let inserted = client
        .execute(
            "INSERT INTO eth.gaps (start, stop, validation) \
             SELECT header_cids.block_number + 1 AS start, min(fr.block_number) - 1 AS stop, \
             false \
             FROM eth.header_cids \
             LEFT JOIN eth.header_cids r ON header_cids.block_number = r.block_number - 1 \
             LEFT JOIN eth.header_cids fr ON header_cids.block_number < fr.block_number \
             WHERE r.block_number IS NULL AND fr.block_number IS NOT NULL \
             GROUP BY header_cids.block_number, r.block_number \
             ON CONFLICT (start, stop) DO NOTHING",
            &[],
        )
        .await?;
    Ok(inserted)
}

/// Heights whose `times_validated` has not yet reached `threshold`, ascending.
pub async fn validation_deficit_blocks(
    client: &Client,
    threshold: i32,
) -> StorageResult<Vec<i64>> {
    let rows = client
        .query(
            "SELECT block_number FROM eth.header_cids WHERE times_validated < $1 \
             ORDER BY block_number",
            &[&threshold],
        )
        .await?;
    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Atomically claims one available gap, marking it checked out in the same statement.
///
/// Returns `None` when every queued gap is already owned by a dispatcher.
pub async fn reserve_gap(client: &Client) -> StorageResult<Option<Gap>> {
    let row = client
        .query_opt(
            "UPDATE eth.gaps SET checked_out = true \
             WHERE id = (SELECT id FROM eth.gaps WHERE checked_out = false \
             ORDER BY start LIMIT 1 FOR UPDATE SKIP LOCKED) \
             RETURNING id, start, stop, validation",
            &[],
        )
        .await?;
    Ok(row.map(|row| Gap {
        id: row.get(0),
        start: row.get(1),
        stop: row.get(2),
        validation: row.get(3),
    }))
}

/// Returns a claimed gap to the queue so another dispatcher may retry it.
pub async fn release_gap(client: &Client, id: i64) -> StorageResult<()> {
    client.execute("UPDATE eth.gaps SET checked_out = false WHERE id = $1", &[&id]).await?;
    Ok(())
}

/// Removes a gap whose entire range has been ingested.
pub async fn delete_gap(client: &Client, id: i64) -> StorageResult<()> {
    client.execute("DELETE FROM eth.gaps WHERE id = $1", &[&id]).await?;
    Ok(())
}

/// Number of queued gaps; the primary operational health signal.
pub async fn gap_count(client: &Client) -> StorageResult<i64> {
    let row = client.query_one("SELECT count(*) FROM eth.gaps", &[]).await?;
    Ok(row.get(0))
}

/// Smallest indexed height, if any block has been indexed yet.
pub async fn min_indexed_block(client: &Client) -> StorageResult<Option<i64>> {
    let row = client.query_one("SELECT min(block_number) FROM eth.header_cids", &[]).await?;
    Ok(row.get(0))
}
