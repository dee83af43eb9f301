//! Shared fixtures for store-backed transform tests.
//!
//! Tests are skipped unless `TEST_DATABASE_URL` points at a throwaway Postgres database; the
//! reference schema is applied once per test binary.

use indexer_primitives::{
    Block, Header, Payload, Receipt, StateNode, StateObject, U256,
};
use indexer_storage::{Pool, PoolClient};
use tokio::sync::OnceCell;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Connection pool against `TEST_DATABASE_URL`, or `None` to skip the test.
pub async fn test_pool() -> Option<Pool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = indexer_storage::new_pool(&url, 8).expect("valid test database url");

    SCHEMA
        .get_or_init(|| async {
            let client = pool.get().await.expect("test database reachable");
            client
                .batch_execute(include_str!("../../../storage/schema.sql"))
                .await
                .expect("schema applies");
        })
        .await;

    Some(pool)
}

/// A payload for an empty block at the given height: no transactions, no uncles, no state
/// changes.
pub fn empty_block_payload(number: u64) -> Payload {
    block_payload(Header { number, gas_limit: 5_000, ..Default::default() }, Vec::new(), Vec::new())
}

/// Assembles a payload from its parts, encoding each component the way the node would.
pub fn block_payload(
    header: Header,
    transactions: Vec<indexer_primitives::TransactionSigned>,
    receipts: Vec<Receipt>,
) -> Payload {
    let block = Block { header, transactions, ommers: Vec::new() };
    payload_with_state(block, receipts, Vec::new())
}

/// Assembles a payload carrying the given state-diff nodes.
pub fn payload_with_state(
    block: Block,
    receipts: Vec<Receipt>,
    nodes: Vec<StateNode>,
) -> Payload {
    let state = StateObject {
        block_number: U256::from(block.number()),
        block_hash: block.hash(),
        nodes,
    };
    Payload {
        block_rlp: alloy_rlp::encode(&block).into(),
        receipts_rlp: alloy_rlp::encode(&receipts).into(),
        state_object_rlp: alloy_rlp::encode(&state).into(),
        total_difficulty: U256::from(block.number() + 1),
    }
}

/// Header row id for a block hash, if indexed.
pub async fn header_id(client: &PoolClient, block_hash: &str) -> Option<i64> {
    client
        .query_opt("SELECT id FROM eth.header_cids WHERE block_hash = $1", &[&block_hash])
        .await
        .expect("query header")
        .map(|row| row.get(0))
}

/// Number of rows a scalar-returning count query yields.
pub async fn count(client: &PoolClient, sql: &str, id: i64) -> i64 {
    client.query_one(sql, &[&id]).await.expect("count query").get(0)
}
