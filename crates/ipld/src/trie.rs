//! Ordered-trie construction for transaction and receipt tries.

use alloy_primitives::{Bytes, B256};
use alloy_trie::{proof::ProofRetainer, HashBuilder, EMPTY_ROOT_HASH};
use nybbles::Nibbles;

/// Adjust the index of an item for rlp encoding.
pub(crate) const fn adjust_index_for_rlp(i: usize, len: usize) -> usize {
    if i > 0x7f {
        i
    } else if i == 0x7f || i + 1 == len {
        0
    } else {
        i + 1
    }
}

/// Builds the ordered Merkle-Patricia trie over `items` keyed by `rlp(index)` and returns its
/// root together with, for every position, the RLP encoding of the trie leaf node holding that
/// position's value.
///
/// Entry values (transactions, receipts) always exceed 32 bytes, so leaves are never inlined
/// into their parent branch and every position resolves to a standalone leaf node.
pub(crate) fn ordered_trie_leaves<T, F>(items: &[T], mut encode: F) -> (B256, Vec<Bytes>)
where
    F: FnMut(&T, &mut Vec<u8>),
{
    if items.is_empty() {
        return (EMPTY_ROOT_HASH, Vec::new())
    }

    let items_len = items.len();
    let targets: Vec<Nibbles> = (0..items_len)
        .map(|i| Nibbles::unpack(&alloy_rlp::encode_fixed_size(&i)))
        .collect();

    let retainer = ProofRetainer::from_iter(targets.iter().cloned());
    let mut hb = HashBuilder::default().with_proof_retainer(retainer);

    let mut value_buffer = Vec::new();
    for i in 0..items_len {
        let index = adjust_index_for_rlp(i, items_len);
        let index_buffer = alloy_rlp::encode_fixed_size(&index);

        value_buffer.clear();
        encode(&items[index], &mut value_buffer);

        hb.add_leaf(Nibbles::unpack(&index_buffer), &value_buffer);
    }

    let root = hb.root();
    let proof_nodes = hb.take_proof_nodes();
    let leaves = targets
        .iter()
        .map(|target| {
            proof_nodes
                .matching_nodes_sorted(target)
                .into_iter()
                .last()
                .map(|(_, node)| node)
                .expect("the retainer keeps at least the root node for every target")
        })
        .collect();

    (root, leaves)
}
