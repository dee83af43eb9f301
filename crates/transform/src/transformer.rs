//! The per-payload transform orchestrator.

use crate::{
    receipts::derive_fields,
    rewards::{base_block_reward, block_reward, ommer_reward},
    TransformError, TransformResult,
};
use alloy_primitives::{keccak256, Address, B256, U256};
use indexer_ipld::{
    from_block_and_receipts, BlockIplds, EthHeader, IpldNode, M_ETH_STATE_TRIE,
    M_ETH_STORAGE_TRIE,
};
use indexer_primitives::{Account, Block, ChainSpec, Header, Payload, Receipt, StateObject};
use indexer_storage::{
    index_header_cid, index_receipt_cid, index_state_account, index_state_cid,
    index_storage_cid, index_transaction_cid, index_uncle_cid,
    models::{
        HeaderModel, ReceiptModel, StateAccountModel, StateNodeModel, StorageNodeModel, TxModel,
        UncleModel,
    },
    publish_ipld, publish_raw, Pool, StorageError, Transaction,
};
use tracing::{debug, info};

/// Renders an address in the `0x`-prefixed lowercase hex form the index stores.
fn address_hex(address: Address) -> String {
    format!("{address:#x}")
}

/// Pads or crops arbitrary leaf-key bytes into a 32-byte hash string, the way hashed keys are
/// persisted.
fn leaf_key_hex(key: &[u8]) -> String {
    let hash = if key.len() > 32 {
        B256::from_slice(&key[key.len() - 32..])
    } else {
        B256::left_padding_from(key)
    };
    hash.to_string()
}

/// Transforms state-diff payloads into published IPLD blocks and index rows, one database
/// transaction per payload.
#[derive(Debug)]
pub struct StateDiffTransformer {
    chain_spec: ChainSpec,
    pool: Pool,
}

impl StateDiffTransformer {
    /// Creates a transformer for the given chain over the shared connection pool.
    pub const fn new(chain_spec: ChainSpec, pool: Pool) -> Self {
        Self { chain_spec, pool }
    }

    /// Processes one payload: decodes it, publishes every IPLD node and writes the full set of
    /// index rows, atomically.
    ///
    /// On success returns the payload's block number. On any error the enclosing database
    /// transaction is rolled back and no rows become visible; an unwind mid-transform drops
    /// the transaction, which rolls back the same way.
    pub async fn transform(&self, worker_id: usize, payload: &Payload) -> TransformResult<u64> {
        use alloy_rlp::Decodable;

        let block = Block::decode(&mut payload.block_rlp.as_ref())?;
        let block_hash = block.hash();
        let block_number = block.number();
        info!(
            target: "transform",
            worker_id,
            block_number,
            %block_hash,
            "transforming state diff payload"
        );

        let mut receipts = Vec::<Receipt>::decode(&mut payload.receipts_rlp.as_ref())?;
        derive_fields(
            &self.chain_spec,
            block_hash,
            block_number,
            &block.transactions,
            &mut receipts,
        )?;

        let iplds = from_block_and_receipts(&block, &receipts)?;
        if iplds.transactions.len() != iplds.tx_trie_nodes.len() ||
            iplds.receipts.len() != iplds.rct_trie_nodes.len() ||
            iplds.transactions.len() != iplds.receipts.len() ||
            iplds.receipts.len() != receipts.len()
        {
            return Err(TransformError::ShapeMismatch {
                transactions: iplds.transactions.len(),
                tx_trie_nodes: iplds.tx_trie_nodes.len(),
                receipts: iplds.receipts.len(),
                receipt_trie_nodes: iplds.rct_trie_nodes.len(),
            })
        }

        let mut client = self.pool.get().await.map_err(StorageError::from)?;
        let tx = client.transaction().await.map_err(StorageError::from)?;

        let result = self
            .process(
                &tx,
                &block,
                block_hash,
                &receipts,
                &iplds,
                &payload.state_object_rlp,
                payload.total_difficulty,
            )
            .await;
        match result {
            Ok(()) => {
                tx.commit().await.map_err(StorageError::from)?;
                metrics::counter!("indexer_payloads_transformed").increment(1);
                Ok(block_number)
            }
            Err(err) => {
                // Dropping the transaction would roll back too; do it eagerly so the
                // connection returns to the pool clean.
                if let Err(rollback_err) = tx.rollback().await {
                    debug!(target: "transform", %rollback_err, "rollback failed");
                }
                metrics::counter!("indexer_transform_failures").increment(1);
                Err(err)
            }
        }
    }

    /// Steps 5 through 8: everything that happens inside the database transaction, in
    /// contractual order.
    #[allow(clippy::too_many_arguments)]
    async fn process(
        &self,
        tx: &Transaction<'_>,
        block: &Block,
        block_hash: B256,
        receipts: &[Receipt],
        iplds: &BlockIplds,
        state_object_rlp: &[u8],
        total_difficulty: U256,
    ) -> TransformResult<()> {
        use alloy_rlp::Decodable;

        let base_reward = base_block_reward(&self.chain_spec, block.number());
        let reward = block_reward(base_reward, block.ommers.len());
        let header_id = self
            .process_header(tx, &block.header, block_hash, &iplds.header, reward, total_difficulty)
            .await?;

        self.process_uncles(tx, header_id, block.number(), base_reward, &iplds.uncles).await?;

        self.process_receipts_and_txs(tx, header_id, block, receipts, iplds).await?;

        let state_diff = StateObject::decode(&mut &*state_object_rlp)?;
        self.process_state_and_storage(tx, header_id, &state_diff).await?;

        Ok(())
    }

    /// Publishes and indexes the header, returning the header row id.
    async fn process_header(
        &self,
        tx: &Transaction<'_>,
        header: &Header,
        block_hash: B256,
        header_node: &EthHeader,
        reward: U256,
        total_difficulty: U256,
    ) -> TransformResult<i64> {
        publish_ipld(tx, header_node).await?;

        let model = HeaderModel {
            block_number: header.number as i64,
            block_hash: block_hash.to_string(),
            parent_hash: header.parent_hash.to_string(),
            cid: header_node.cid().to_string(),
            mh_key: indexer_ipld::multihash_key_from_cid(header_node.cid()),
            total_difficulty: total_difficulty.to_string(),
            reward: reward.to_string(),
            state_root: header.state_root.to_string(),
            tx_root: header.transactions_root.to_string(),
            receipt_root: header.receipts_root.to_string(),
            uncle_root: header.ommers_hash.to_string(),
            bloom: header.logs_bloom.to_vec(),
            timestamp: header.timestamp as i64,
        };
        Ok(index_header_cid(tx, &model).await?)
    }

    /// Publishes and indexes every uncle header under the enclosing header row.
    async fn process_uncles(
        &self,
        tx: &Transaction<'_>,
        header_id: i64,
        block_number: u64,
        base_reward: U256,
        uncle_nodes: &[EthHeader],
    ) -> TransformResult<()> {
        for uncle_node in uncle_nodes {
            publish_ipld(tx, uncle_node).await?;

            let reward = ommer_reward(base_reward, block_number, uncle_node.number);
            let uncle = UncleModel {
                block_hash: uncle_node.hash.to_string(),
                parent_hash: uncle_node.parent_hash.to_string(),
                cid: uncle_node.cid().to_string(),
                mh_key: indexer_ipld::multihash_key_from_cid(uncle_node.cid()),
                reward: reward.to_string(),
            };
            index_uncle_cid(tx, &uncle, header_id).await?;
        }
        Ok(())
    }

    /// Publishes and indexes every transaction with its receipt, in positional order.
    async fn process_receipts_and_txs(
        &self,
        tx: &Transaction<'_>,
        header_id: i64,
        block: &Block,
        receipts: &[Receipt],
        iplds: &BlockIplds,
    ) -> TransformResult<()> {
        let signer = self.chain_spec.signer(block.number());
        for (index, receipt) in receipts.iter().enumerate() {
            let transaction = &block.transactions[index];
            let from = signer.sender(transaction)?;

            // Trie nodes are published but never indexed as rows.
            publish_ipld(tx, &iplds.tx_trie_nodes[index]).await?;
            publish_ipld(tx, &iplds.rct_trie_nodes[index]).await?;

            let tx_node = &iplds.transactions[index];
            let rct_node = &iplds.receipts[index];
            publish_ipld(tx, tx_node).await?;
            publish_ipld(tx, rct_node).await?;

            if receipt.contract_address.is_some() {
                // The creation payload is published under its own multihash so the contract
                // hash resolves to bytecode; the codec is irrelevant to the blob key.
                publish_raw(tx, M_ETH_STORAGE_TRIE, transaction.input()).await?;
            }

            let tx_model = TxModel {
                tx_hash: transaction.hash().to_string(),
                index: index as i64,
                cid: tx_node.cid().to_string(),
                mh_key: indexer_ipld::multihash_key_from_cid(tx_node.cid()),
                dst: transaction.to().map(|to| address_hex(*to)).unwrap_or_default(),
                src: address_hex(from),
                data: transaction.input().to_vec(),
                deployment: receipt.contract_address.is_some(),
            };
            let tx_id = index_transaction_cid(tx, &tx_model, header_id).await?;

            let rct_model = receipt_model(
                receipt,
                rct_node.cid().to_string(),
                indexer_ipld::multihash_key_from_cid(rct_node.cid()),
            );
            index_receipt_cid(tx, &rct_model, tx_id).await?;
        }
        Ok(())
    }

    /// Publishes and indexes the changed state and storage trie nodes.
    async fn process_state_and_storage(
        &self,
        tx: &Transaction<'_>,
        header_id: i64,
        state_diff: &StateObject,
    ) -> TransformResult<()> {
        for state_node in &state_diff.nodes {
            let (state_cid, state_mh_key) =
                publish_raw(tx, M_ETH_STATE_TRIE, &state_node.node_value).await?;

            let model = StateNodeModel {
                state_key: leaf_key_hex(&state_node.leaf_key),
                path: state_node.path.to_vec(),
                cid: state_cid,
                mh_key: state_mh_key,
                node_type: state_node.node_type.as_int(),
            };
            let state_id = index_state_cid(tx, &model, header_id).await?;

            if state_node.node_type.is_leaf() {
                let account = Account::from_leaf_node(&state_node.node_value)?;
                let account_model = StateAccountModel {
                    balance: account.balance.to_string(),
                    nonce: account.nonce as i64,
                    code_hash: account.code_hash.to_vec(),
                    storage_root: account.storage_root.to_string(),
                };
                index_state_account(tx, &account_model, state_id).await?;
            }

            for storage_node in &state_node.storage_nodes {
                let (storage_cid, storage_mh_key) =
                    publish_raw(tx, M_ETH_STORAGE_TRIE, &storage_node.node_value).await?;

                let storage_model = StorageNodeModel {
                    storage_key: leaf_key_hex(&storage_node.leaf_key),
                    path: storage_node.path.to_vec(),
                    cid: storage_cid,
                    mh_key: storage_mh_key,
                    node_type: storage_node.node_type.as_int(),
                };
                index_storage_cid(tx, &storage_model, state_id).await?;
            }
        }
        Ok(())
    }
}

/// Normalises a receipt's logs into the four positional topic arrays and the deduplicated set
/// of emitting contracts.
fn receipt_model(receipt: &Receipt, cid: String, mh_key: String) -> ReceiptModel {
    let mut topics: [Vec<String>; 4] = Default::default();
    let mut log_contracts: Vec<String> = Vec::new();

    for log in &receipt.logs {
        let log_topics = log.data.topics();
        for (position, set) in topics.iter_mut().enumerate() {
            // Absent topics yield empty slots so the arrays stay aligned with log order.
            set.push(
                log_topics.get(position).map(|topic| topic.to_string()).unwrap_or_default(),
            );
        }
        let address = address_hex(log.address);
        if !log_contracts.contains(&address) {
            log_contracts.push(address);
        }
    }

    let [topic0s, topic1s, topic2s, topic3s] = topics;
    let (contract, contract_hash) = match receipt.contract_address {
        Some(address) => {
            (address_hex(address), keccak256(address.as_slice()).to_string())
        }
        None => (String::new(), String::new()),
    };

    ReceiptModel {
        cid,
        mh_key,
        contract,
        contract_hash,
        topic0s,
        topic1s,
        topic2s,
        topic3s,
        log_contracts,
    }
}
