//! Postgres persistence for the IPLD indexer: the content-addressed blob store, the relational
//! CID index and the gaps work queue.
//!
//! All row writers are enlisted in a caller-provided [`tokio_postgres::Transaction`]; a
//! transaction that is dropped without an explicit commit rolls back, which is what keeps a
//! failed or panicking transform from leaving partial rows behind.

mod db;
mod error;
pub mod gaps;
mod indexer;
pub mod models;
mod publisher;

pub use db::new_pool;
pub use error::{StorageError, StorageResult};
pub use indexer::{
    index_header_cid, index_receipt_cid, index_state_account, index_state_cid,
    index_storage_cid, index_transaction_cid, index_uncle_cid,
};
pub use publisher::{publish_ipld, publish_raw};

pub use deadpool_postgres::{Object as PoolClient, Pool, Transaction};
