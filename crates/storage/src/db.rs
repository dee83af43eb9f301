use crate::{StorageError, StorageResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Builds the shared connection pool all indexer roles draw from.
///
/// `max_size` should cover the live tail, the gap finder and every backfill dispatcher, plus
/// headroom for the transform transactions they open.
pub fn new_pool(database_url: &str, max_size: usize) -> StorageResult<Pool> {
    let config = database_url.parse::<tokio_postgres::Config>()?;
    let manager = Manager::from_config(
        config,
        NoTls,
        ManagerConfig { recycling_method: RecyclingMethod::Fast },
    );
    Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|err| StorageError::Config(err.to_string()))
}
