//! Ethereum payload types for the IPLD indexer: blocks, transactions, receipts and state-diff
//! objects, together with their RLP codecs, sender recovery and the fork schedule that selects
//! signature schemes and reward eras.

mod block;
mod chainspec;
mod header;
mod receipt;
mod signature;
mod statediff;
mod transaction;

pub use block::Block;
pub use chainspec::{ChainSpec, MAINNET};
pub use header::Header;
pub use receipt::Receipt;
pub use signature::Signature;
pub use statediff::{Account, NodeType, Payload, StateNode, StateObject, StorageNode};
pub use transaction::{Signer, SignerError, TransactionKind, TransactionSigned, TxLegacy};

pub use alloy_primitives::{Address, Bloom, Bytes, ChainId, TxHash, B256, U256};
