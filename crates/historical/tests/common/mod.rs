//! Shared fixtures for store-backed gap tests.

use indexer_primitives::{Block, Header, Payload, Receipt, StateObject, U256};
use indexer_storage::Pool;
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

/// A payload for an empty block at the given height.
pub fn empty_block_payload(number: u64) -> Payload {
    let block = Block {
        header: Header { number, gas_limit: 5_000, ..Default::default() },
        transactions: Vec::new(),
        ommers: Vec::new(),
    };
    let state = StateObject {
        block_number: U256::from(number),
        block_hash: block.hash(),
        nodes: Vec::new(),
    };
    Payload {
        block_rlp: alloy_rlp::encode(&block).into(),
        receipts_rlp: alloy_rlp::encode(&Vec::<Receipt>::new()).into(),
        state_object_rlp: alloy_rlp::encode(&state).into(),
        total_difficulty: U256::from(number + 1),
    }
}
