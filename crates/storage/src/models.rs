//! Row models for the CID index.
//!
//! Every model mirrors one table from `schema.sql`. Hashes and addresses are stored in their
//! `0x`-prefixed hex form; large scalars (difficulty, rewards, balances) travel as decimal
//! strings and are cast to `NUMERIC` in the statements that persist them.

/// Row model for `eth.header_cids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderModel {
    /// Height of the block.
    pub block_number: i64,
    /// Hash of the block.
    pub block_hash: String,
    /// Hash of the parent block.
    pub parent_hash: String,
    /// CID of the header IPLD.
    pub cid: String,
    /// Blob-store key of the header IPLD.
    pub mh_key: String,
    /// Total difficulty at this block, decimal string.
    pub total_difficulty: String,
    /// Miner reward for this block, decimal string.
    pub reward: String,
    /// State-trie root committed by the header.
    pub state_root: String,
    /// Transaction-trie root committed by the header.
    pub tx_root: String,
    /// Receipt-trie root committed by the header.
    pub receipt_root: String,
    /// Ommers-list hash committed by the header.
    pub uncle_root: String,
    /// Logs bloom bytes.
    pub bloom: Vec<u8>,
    /// Block timestamp, seconds.
    pub timestamp: i64,
}

/// Row model for `eth.uncle_cids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UncleModel {
    /// Hash of the uncle block.
    pub block_hash: String,
    /// Hash of the uncle's parent.
    pub parent_hash: String,
    /// CID of the uncle-header IPLD.
    pub cid: String,
    /// Blob-store key of the uncle-header IPLD.
    pub mh_key: String,
    /// Uncle miner reward, decimal string.
    pub reward: String,
}

/// Row model for `eth.transaction_cids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxModel {
    /// Hash of the transaction.
    pub tx_hash: String,
    /// Position of the transaction within its block.
    pub index: i64,
    /// CID of the transaction IPLD.
    pub cid: String,
    /// Blob-store key of the transaction IPLD.
    pub mh_key: String,
    /// Recipient address, empty for contract creations.
    pub dst: String,
    /// Recovered sender address.
    pub src: String,
    /// Call data or init code.
    pub data: Vec<u8>,
    /// Whether this transaction deployed a contract.
    pub deployment: bool,
}

/// Row model for `eth.receipt_cids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiptModel {
    /// CID of the receipt IPLD.
    pub cid: String,
    /// Blob-store key of the receipt IPLD.
    pub mh_key: String,
    /// Address of the deployed contract, empty when the receipt is not for a creation.
    pub contract: String,
    /// Keccak hash of the deployed contract address, empty when not a creation.
    pub contract_hash: String,
    /// First topic of each log, aligned with log order.
    pub topic0s: Vec<String>,
    /// Second topic of each log, aligned with log order.
    pub topic1s: Vec<String>,
    /// Third topic of each log, aligned with log order.
    pub topic2s: Vec<String>,
    /// Fourth topic of each log, aligned with log order.
    pub topic3s: Vec<String>,
    /// Deduplicated addresses that emitted logs in this receipt.
    pub log_contracts: Vec<String>,
}

/// Row model for `eth.state_cids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateNodeModel {
    /// Hashed account key, empty for interior nodes.
    pub state_key: String,
    /// Nibble path to the node.
    pub path: Vec<u8>,
    /// CID of the state-trie-node IPLD.
    pub cid: String,
    /// Blob-store key of the state-trie-node IPLD.
    pub mh_key: String,
    /// Trie node kind, integer encoded.
    pub node_type: i32,
}

/// Row model for `eth.state_accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateAccountModel {
    /// Account balance in Wei, decimal string.
    pub balance: String,
    /// Account nonce.
    pub nonce: i64,
    /// Keccak hash of the account bytecode.
    pub code_hash: Vec<u8>,
    /// Root of the account's storage trie.
    pub storage_root: String,
}

/// Row model for `eth.storage_cids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageNodeModel {
    /// Hashed storage slot, empty for interior nodes.
    pub storage_key: String,
    /// Nibble path to the node.
    pub path: Vec<u8>,
    /// CID of the storage-trie-node IPLD.
    pub cid: String,
    /// Blob-store key of the storage-trie-node IPLD.
    pub mh_key: String,
    /// Trie node kind, integer encoded.
    pub node_type: i32,
}

/// Row model for `eth.gaps`: a contiguous block range missing from or under-validated in the
/// header index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    /// Surrogate id used for reservation bookkeeping.
    pub id: i64,
    /// First missing block, inclusive.
    pub start: i64,
    /// Last missing block, inclusive.
    pub stop: i64,
    /// Whether this range exists for revalidation rather than first ingestion.
    pub validation: bool,
}
