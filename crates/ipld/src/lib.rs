//! Construction of content-addressed IPLD nodes for every logical component of an Ethereum
//! block: header, uncles, transactions, receipts and the leaf nodes of the transaction and
//! receipt tries.

mod codec;
mod node;
mod trie;

pub use codec::{
    keccak256_cid, multihash_key_from_cid, multihash_key_from_cid_string, CidError, KECCAK_256,
    M_ETH_ACCOUNT_SNAPSHOT, M_ETH_HEADER, M_ETH_HEADER_LIST, M_ETH_STATE_TRIE,
    M_ETH_STORAGE_TRIE, M_ETH_TX, M_ETH_TX_RECEIPT, M_ETH_TX_RECEIPT_TRIE, M_ETH_TX_TRIE,
};
pub use node::{EthHeader, EthRctTrie, EthReceipt, EthTx, EthTxTrie, IpldNode};

use alloy_rlp::Encodable;
use indexer_primitives::{Block, Receipt};

/// Errors raised while assembling the IPLD view of a block.
#[derive(Debug, thiserror::Error)]
pub enum IpldError {
    /// The receipts list does not pair up with the block's transactions.
    #[error("block has {transactions} transactions but {receipts} receipts")]
    ReceiptCountMismatch {
        /// Number of transactions in the block.
        transactions: usize,
        /// Number of receipts supplied alongside it.
        receipts: usize,
    },
}

/// The complete IPLD view of one block.
///
/// The four per-position lists are aligned with the block's transactions: entry `i` of each
/// list belongs to transaction `i` and its receipt.
#[derive(Debug, Clone)]
pub struct BlockIplds {
    /// Header node.
    pub header: EthHeader,
    /// One node per uncle header.
    pub uncles: Vec<EthHeader>,
    /// One node per transaction.
    pub transactions: Vec<EthTx>,
    /// The transaction-trie leaf holding each transaction.
    pub tx_trie_nodes: Vec<EthTxTrie>,
    /// One node per receipt.
    pub receipts: Vec<EthReceipt>,
    /// The receipt-trie leaf holding each receipt.
    pub rct_trie_nodes: Vec<EthRctTrie>,
}

/// Builds IPLD nodes for every component of `block` and its `receipts`.
///
/// Returns one transaction node, one receipt node, one transaction-trie leaf and one
/// receipt-trie leaf per position; all four lists have the same length as `receipts`.
pub fn from_block_and_receipts(
    block: &Block,
    receipts: &[Receipt],
) -> Result<BlockIplds, IpldError> {
    if block.transactions.len() != receipts.len() {
        return Err(IpldError::ReceiptCountMismatch {
            transactions: block.transactions.len(),
            receipts: receipts.len(),
        })
    }

    let header = EthHeader::new(&block.header);
    let uncles = block.ommers.iter().map(EthHeader::new).collect();

    let transactions = block.transactions.iter().map(EthTx::new).collect();
    let (_, tx_leaves) =
        trie::ordered_trie_leaves(&block.transactions, |tx, buf| tx.encode(buf));
    let tx_trie_nodes = tx_leaves.into_iter().map(EthTxTrie::new).collect();

    let receipt_nodes = receipts.iter().map(EthReceipt::new).collect();
    let (_, rct_leaves) = trie::ordered_trie_leaves(receipts, |rct, buf| rct.encode(buf));
    let rct_trie_nodes = rct_leaves.into_iter().map(EthRctTrie::new).collect();

    Ok(BlockIplds {
        header,
        uncles,
        transactions,
        tx_trie_nodes,
        receipts: receipt_nodes,
        rct_trie_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use alloy_rlp::Decodable;
    use hex_literal::hex;
    use indexer_primitives::Header;

    // Same single-transaction block fixture as the primitives tests.
    fn block() -> Block {
        let data = hex!("f90262f901f9a092230ce5476ae868e98c7979cfc165a93f8b6ad1922acf2df62e340916efd49da01dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347942adc25665018aa1fe0e6bc666dac8fc2697ff9baa02307107a867056ca33b5087e77c4174f47625e48fb49f1c70ced34890ddd88f3a08151d548273f6683169524b66ca9fe338b9ce42bc3540046c828fd939ae23bcba0c598f69a5674cae9337261b669970e24abc0b46e6d284372a239ec8ccbf20b0ab901000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000083020000018502540be40082a8618203e800a00000000000000000000000000000000000000000000000000000000000000000880000000000000000f863f861800a8405f5e10094100000000000000000000000000000000000000080801ba07e09e26678ed4fac08a249ebe8ed680bf9051a5e14ad223e4b2b9d26e0208f37a05f6e3f188e3e6eab7d7d3b6568f5eac7d687b08d307d3154ccd8c87b4630509bc0");
        Block::decode(&mut data.as_slice()).unwrap()
    }

    #[test]
    fn shapes_align_with_receipts() {
        let block = block();
        let receipts = vec![Receipt { cumulative_gas_used: 21_000, ..Default::default() }];
        let iplds = from_block_and_receipts(&block, &receipts).unwrap();

        assert_eq!(iplds.transactions.len(), 1);
        assert_eq!(iplds.tx_trie_nodes.len(), 1);
        assert_eq!(iplds.receipts.len(), 1);
        assert_eq!(iplds.rct_trie_nodes.len(), 1);
        assert!(iplds.uncles.is_empty());
    }

    #[test]
    fn rejects_receipt_count_mismatch() {
        let block = block();
        let err = from_block_and_receipts(&block, &[]).unwrap_err();
        assert!(matches!(
            err,
            IpldError::ReceiptCountMismatch { transactions: 1, receipts: 0 }
        ));
    }

    #[test]
    fn single_tx_trie_leaf_hashes_to_transactions_root() {
        let block = block();
        let receipts = vec![Receipt::default()];
        let iplds = from_block_and_receipts(&block, &receipts).unwrap();

        // With one transaction, the trie leaf is the root node, so its keccak is the
        // header's transactions root.
        assert_eq!(
            keccak256(iplds.tx_trie_nodes[0].raw_data()),
            block.header.transactions_root
        );
    }

    #[test]
    fn header_cid_is_stable_across_runs() {
        let header = Header { number: 7, ..Default::default() };
        let block =
            Block { header, transactions: Vec::new(), ommers: Vec::new() };
        let a = from_block_and_receipts(&block, &[]).unwrap();
        let b = from_block_and_receipts(&block, &[]).unwrap();
        assert_eq!(a.header.cid(), b.header.cid());
    }
}
