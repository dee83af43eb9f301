//! Per-entity CID index writers.
//!
//! Each function inserts one row inside the caller's transaction and returns the surrogate id
//! dependent rows use as their foreign key. Conflicting inserts upsert, so re-ingesting a
//! payload converges on the same row contents; the header upsert additionally bumps
//! `times_validated`, which is what retires revalidation gaps.

use crate::{
    models::{
        HeaderModel, ReceiptModel, StateAccountModel, StateNodeModel, StorageNodeModel, TxModel,
        UncleModel,
    },
    StorageResult,
};
use tokio_postgres::Transaction;

/// Inserts or refreshes a header row, returning its id.
pub async fn index_header_cid(tx: &Transaction<'_>, header: &HeaderModel) -> StorageResult<i64> {
    let row = tx
        .query_one(
            "INSERT INTO eth.header_cids (block_number, block_hash, parent_hash, cid, mh_key, \
             td, reward, state_root, tx_root, receipt_root, uncle_root, bloom, timestamp, \
             times_validated) \
             VALUES ($1, $2, $3, $4, $5, $6::numeric, $7::numeric, $8, $9, $10, $11, $12, $13, 1) \
             ON CONFLICT (block_number, block_hash) DO UPDATE SET (parent_hash, cid, mh_key, td, \
             reward, state_root, tx_root, receipt_root, uncle_root, bloom, timestamp, \
             times_validated) = ($3, $4, $5, $6::numeric, $7::numeric, $8, $9, $10, $11, $12, \
             $13, eth.header_cids.times_validated + 1) \
             RETURNING id",
            &[
                &header.block_number,
                &header.block_hash,
                &header.parent_hash,
                &header.cid,
                &header.mh_key,
                &header.total_difficulty,
                &header.reward,
                &header.state_root,
                &header.tx_root,
                &header.receipt_root,
                &header.uncle_root,
                &header.bloom,
                &header.timestamp,
            ],
        )
        .await?;
    Ok(row.get(0))
}

/// Inserts or refreshes an uncle row keyed by its header.
pub async fn index_uncle_cid(
    tx: &Transaction<'_>,
    uncle: &UncleModel,
    header_id: i64,
) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO eth.uncle_cids (header_id, block_hash, parent_hash, cid, mh_key, reward) \
         VALUES ($1, $2, $3, $4, $5, $6::numeric) \
         ON CONFLICT (header_id, block_hash) DO UPDATE SET (parent_hash, cid, mh_key, reward) = \
         ($3, $4, $5, $6::numeric)",
        &[
            &header_id,
            &uncle.block_hash,
            &uncle.parent_hash,
            &uncle.cid,
            &uncle.mh_key,
            &uncle.reward,
        ],
    )
    .await?;
    Ok(())
}

/// Inserts or refreshes a transaction row keyed by its header, returning the transaction id.
pub async fn index_transaction_cid(
    tx: &Transaction<'_>,
    transaction: &TxModel,
    header_id: i64,
) -> StorageResult<i64> {
    let row = tx
        .query_one(
            "INSERT INTO eth.transaction_cids (header_id, tx_hash, index, cid, mh_key, dst, \
             src, tx_data, deployment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (header_id, tx_hash) DO UPDATE SET (index, cid, mh_key, dst, src, \
             tx_data, deployment) = ($3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
            &[
                &header_id,
                &transaction.tx_hash,
                &transaction.index,
                &transaction.cid,
                &transaction.mh_key,
                &transaction.dst,
                &transaction.src,
                &transaction.data,
                &transaction.deployment,
            ],
        )
        .await?;
    Ok(row.get(0))
}

/// Inserts or refreshes a receipt row keyed by its transaction.
pub async fn index_receipt_cid(
    tx: &Transaction<'_>,
    receipt: &ReceiptModel,
    tx_id: i64,
) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO eth.receipt_cids (tx_id, cid, mh_key, contract, contract_hash, topic0s, \
         topic1s, topic2s, topic3s, log_contracts) \
         VALUES ($1, $2, $3, $4, $5, $6::varchar(66)[], $7::varchar(66)[], $8::varchar(66)[], \
         $9::varchar(66)[], $10::varchar(66)[]) \
         ON CONFLICT (tx_id) DO UPDATE SET (cid, mh_key, contract, contract_hash, topic0s, \
         topic1s, topic2s, topic3s, log_contracts) = ($2, $3, $4, $5, $6::varchar(66)[], \
         $7::varchar(66)[], $8::varchar(66)[], $9::varchar(66)[], $10::varchar(66)[])",
        &[
            &tx_id,
            &receipt.cid,
            &receipt.mh_key,
            &receipt.contract,
            &receipt.contract_hash,
            &receipt.topic0s,
            &receipt.topic1s,
            &receipt.topic2s,
            &receipt.topic3s,
            &receipt.log_contracts,
        ],
    )
    .await?;
    Ok(())
}

/// Inserts or refreshes a state-trie-node row keyed by its header, returning the state id.
pub async fn index_state_cid(
    tx: &Transaction<'_>,
    node: &StateNodeModel,
    header_id: i64,
) -> StorageResult<i64> {
    let row = tx
        .query_one(
            "INSERT INTO eth.state_cids (header_id, state_leaf_key, cid, mh_key, state_path, \
             node_type) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (header_id, state_path) DO UPDATE SET (state_leaf_key, cid, mh_key, \
             node_type) = ($2, $3, $4, $6) \
             RETURNING id",
            &[&header_id, &node.state_key, &node.cid, &node.mh_key, &node.path, &node.node_type],
        )
        .await?;
    Ok(row.get(0))
}

/// Inserts or refreshes the account row for a leaf state node.
pub async fn index_state_account(
    tx: &Transaction<'_>,
    account: &StateAccountModel,
    state_id: i64,
) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO eth.state_accounts (state_id, balance, nonce, code_hash, storage_root) \
         VALUES ($1, $2::numeric, $3, $4, $5) \
         ON CONFLICT (state_id) DO UPDATE SET (balance, nonce, code_hash, storage_root) = \
         ($2::numeric, $3, $4, $5)",
        &[&state_id, &account.balance, &account.nonce, &account.code_hash, &account.storage_root],
    )
    .await?;
    Ok(())
}

/// Inserts or refreshes a storage-trie-node row keyed by its state node.
pub async fn index_storage_cid(
    tx: &Transaction<'_>,
    node: &StorageNodeModel,
    state_id: i64,
) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO eth.storage_cids (state_id, storage_leaf_key, cid, mh_key, storage_path, \
         node_type) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (state_id, storage_path) DO UPDATE SET (storage_leaf_key, cid, mh_key, \
         node_type) = ($2, $3, $4, $6)",
        &[&state_id, &node.storage_key, &node.cid, &node.mh_key, &node.path, &node.node_type],
    )
    .await?;
    Ok(())
}
