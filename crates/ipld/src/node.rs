//! Typed IPLD nodes for Ethereum block components.

use crate::codec::{
    keccak256_cid, M_ETH_HEADER, M_ETH_TX, M_ETH_TX_RECEIPT, M_ETH_TX_RECEIPT_TRIE, M_ETH_TX_TRIE,
};
use alloy_primitives::{Bytes, B256};
use cid::Cid;
use indexer_primitives::{Header, Receipt, TransactionSigned};

/// A content-addressed IPLD block: canonical bytes plus the CID derived from them.
pub trait IpldNode: Send + Sync {
    /// The content identifier of this node.
    fn cid(&self) -> &Cid;
    /// The canonical bytes published under the CID.
    fn raw_data(&self) -> &[u8];
}

macro_rules! impl_ipld_node {
    ($($ty:ty),*) => {$(
        impl IpldNode for $ty {
            fn cid(&self) -> &Cid {
                &self.cid
            }

            fn raw_data(&self) -> &[u8] {
                &self.raw
            }
        }
    )*};
}

impl_ipld_node!(EthHeader, EthTx, EthReceipt, EthTxTrie, EthRctTrie);

/// IPLD node for a block header or an uncle header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthHeader {
    cid: Cid,
    raw: Bytes,
    /// Height of the (uncle) block.
    pub number: u64,
    /// Hash of the encoded header.
    pub hash: B256,
    /// Hash of the parent block.
    pub parent_hash: B256,
}

impl EthHeader {
    /// Encodes a header and derives its content address.
    pub fn new(header: &Header) -> Self {
        let raw = alloy_rlp::encode(header);
        let cid = keccak256_cid(M_ETH_HEADER, &raw);
        Self {
            cid,
            hash: alloy_primitives::keccak256(&raw),
            number: header.number,
            parent_hash: header.parent_hash,
            raw: raw.into(),
        }
    }
}

/// IPLD node for a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTx {
    cid: Cid,
    raw: Bytes,
    /// Hash of the transaction.
    pub tx_hash: B256,
}

impl EthTx {
    /// Encodes a transaction and derives its content address.
    pub fn new(tx: &TransactionSigned) -> Self {
        let raw = alloy_rlp::encode(tx);
        Self { cid: keccak256_cid(M_ETH_TX, &raw), raw: raw.into(), tx_hash: tx.hash() }
    }
}

/// IPLD node for a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthReceipt {
    cid: Cid,
    raw: Bytes,
}

impl EthReceipt {
    /// Encodes a receipt's consensus fields and derives its content address.
    pub fn new(receipt: &Receipt) -> Self {
        let raw = alloy_rlp::encode(receipt);
        Self { cid: keccak256_cid(M_ETH_TX_RECEIPT, &raw), raw: raw.into() }
    }
}

/// IPLD node for a transaction-trie leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTxTrie {
    cid: Cid,
    raw: Bytes,
}

impl EthTxTrie {
    /// Wraps a trie node's RLP and derives its content address.
    pub fn new(raw: Bytes) -> Self {
        Self { cid: keccak256_cid(M_ETH_TX_TRIE, &raw), raw }
    }
}

/// IPLD node for a receipt-trie leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthRctTrie {
    cid: Cid,
    raw: Bytes,
}

impl EthRctTrie {
    /// Wraps a trie node's RLP and derives its content address.
    pub fn new(raw: Bytes) -> Self {
        Self { cid: keccak256_cid(M_ETH_TX_RECEIPT_TRIE, &raw), raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn header_node_carries_navigation_fields() {
        let header = Header { number: 42, ..Default::default() };
        let node = EthHeader::new(&header);
        assert_eq!(node.number, 42);
        assert_eq!(node.hash, header.hash_slow());
        assert_eq!(node.parent_hash, header.parent_hash);
        assert_eq!(node.cid().codec(), M_ETH_HEADER);
        assert_eq!(node.cid().hash().digest(), keccak256(node.raw_data()).as_slice());
    }

    #[test]
    fn tx_node_hash_matches_raw_data() {
        let tx = TransactionSigned::default();
        let node = EthTx::new(&tx);
        assert_eq!(node.raw_data(), alloy_rlp::encode(&tx));
        assert_eq!(node.cid().codec(), M_ETH_TX);
    }
}
