use alloy_primitives::{Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, Error as RlpError, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// Block payload emitted by the upstream node: the RLP of the block, its receipts and the
/// state-diff object, plus the total difficulty at that height.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// RLP encoding of the full block.
    pub block_rlp: Bytes,
    /// RLP encoding of the block's receipts.
    pub receipts_rlp: Bytes,
    /// RLP encoding of the [`StateObject`] for the block.
    pub state_object_rlp: Bytes,
    /// Total difficulty of the chain up to and including this block.
    pub total_difficulty: U256,
}

/// The set of state-trie nodes changed at one block, each optionally carrying the storage-trie
/// nodes changed under the corresponding account.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct StateObject {
    /// Height the diff was taken at.
    pub block_number: U256,
    /// Hash of the block the diff was taken at.
    pub block_hash: B256,
    /// Changed state-trie nodes.
    pub nodes: Vec<StateNode>,
}

/// A single changed state-trie node.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct StateNode {
    /// Kind of trie node.
    pub node_type: NodeType,
    /// Nibble path from the root to this node.
    pub path: Bytes,
    /// Hashed account key, set for leaf nodes only.
    pub leaf_key: Bytes,
    /// RLP encoding of the node itself.
    pub node_value: Bytes,
    /// Changed storage-trie nodes under this account.
    pub storage_nodes: Vec<StorageNode>,
}

/// A single changed storage-trie node.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct StorageNode {
    /// Kind of trie node.
    pub node_type: NodeType,
    /// Nibble path from the storage root to this node.
    pub path: Bytes,
    /// Hashed storage slot, set for leaf nodes only.
    pub leaf_key: Bytes,
    /// RLP encoding of the node itself.
    pub node_value: Bytes,
}

/// Merkle-Patricia trie node kinds as carried on the wire and persisted in node-type columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NodeType {
    /// A node with up to sixteen children and an optional value.
    #[default]
    Branch = 0,
    /// A node carrying a shared nibble prefix.
    Extension = 1,
    /// A value-bearing node.
    Leaf = 2,
    /// Marker for a node deleted at this block.
    Removed = 3,
}

impl NodeType {
    /// Integer form persisted in the relational index.
    pub const fn as_int(&self) -> i32 {
        *self as i32
    }

    /// Whether this node carries a value.
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf)
    }
}

impl Encodable for NodeType {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        (*self as u8).encode(out);
    }

    fn length(&self) -> usize {
        1
    }
}

impl Decodable for NodeType {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        match u8::decode(buf)? {
            0 => Ok(Self::Branch),
            1 => Ok(Self::Extension),
            2 => Ok(Self::Leaf),
            3 => Ok(Self::Removed),
            _ => Err(RlpError::Custom("unknown trie node type")),
        }
    }
}

/// An Ethereum account as embedded in state-trie leaves.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct Account {
    /// Number of transactions sent from this account.
    pub nonce: u64,
    /// Balance in Wei.
    pub balance: U256,
    /// Root of the account's storage trie.
    pub storage_root: B256,
    /// Keccak hash of the account's bytecode.
    pub code_hash: B256,
}

impl Account {
    /// Decodes the account embedded in a state-trie leaf node.
    ///
    /// The leaf decodes to a two-element list `[encoded_path, account_rlp]`; anything else is
    /// rejected.
    pub fn from_leaf_node(node_value: &[u8]) -> alloy_rlp::Result<Self> {
        let buf = &mut &*node_value;
        let header = alloy_rlp::Header::decode(buf)?;
        if !header.list {
            return Err(RlpError::UnexpectedString)
        }
        let started_len = buf.len();

        let _encoded_path: Bytes = Decodable::decode(buf)?;
        let account_rlp: Bytes = Decodable::decode(buf)?;

        if started_len - buf.len() != header.payload_length {
            return Err(RlpError::Custom("state leaf node must decode to two elements"))
        }

        Self::decode(&mut &account_rlp[..])
    }
}
