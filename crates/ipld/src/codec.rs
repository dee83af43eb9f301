//! Multicodec table and content-address derivation.
//!
//! Every IPLD block this pipeline publishes is addressed by a CIDv1 built from a per-entity
//! multicodec and a KECCAK-256 multihash over the entity's canonical bytes. The blob store is
//! keyed by the multihash alone, rendered in the datastore key form
//! `"/" + base32-upper(multihash bytes)`, so consumers can resolve blobs without a CID parser.

use alloy_primitives::keccak256;
use cid::Cid;
use multibase::Base;
use multihash::Multihash;

/// Multicodec for Ethereum block headers and uncle headers.
pub const M_ETH_HEADER: u64 = 0x90;
/// Multicodec for Ethereum uncle-header lists.
pub const M_ETH_HEADER_LIST: u64 = 0x91;
/// Multicodec for transaction-trie nodes.
pub const M_ETH_TX_TRIE: u64 = 0x92;
/// Multicodec for transactions.
pub const M_ETH_TX: u64 = 0x93;
/// Multicodec for receipt-trie nodes.
pub const M_ETH_TX_RECEIPT_TRIE: u64 = 0x94;
/// Multicodec for transaction receipts.
pub const M_ETH_TX_RECEIPT: u64 = 0x95;
/// Multicodec for state-trie nodes.
pub const M_ETH_STATE_TRIE: u64 = 0x96;
/// Multicodec for account snapshots.
pub const M_ETH_ACCOUNT_SNAPSHOT: u64 = 0x97;
/// Multicodec for storage-trie nodes.
pub const M_ETH_STORAGE_TRIE: u64 = 0x98;

/// KECCAK-256 multihash code (standard).
pub const KECCAK_256: u64 = 0x1b;

/// Errors raised while deriving content addresses.
#[derive(Debug, thiserror::Error)]
pub enum CidError {
    /// The input was not a parseable CID string.
    #[error("invalid cid: {0}")]
    InvalidCid(#[from] cid::Error),
}

/// Builds the CIDv1 for `bytes` under the given multicodec, hashing with KECCAK-256.
///
/// Identical bytes always yield identical CIDs.
pub fn keccak256_cid(codec: u64, bytes: &[u8]) -> Cid {
    let digest = keccak256(bytes);
    let mh = Multihash::<64>::wrap(KECCAK_256, digest.as_slice())
        .expect("a 32-byte digest always fits a 64-byte multihash");
    Cid::new_v1(codec, mh)
}

/// Derives the blob-store key from a CID: the datastore key form of its multihash.
pub fn multihash_key_from_cid(cid: &Cid) -> String {
    format!("/{}", Base::Base32Upper.encode(cid.hash().to_bytes()))
}

/// Re-derives the blob-store key from a CID string, as stored in index rows.
pub fn multihash_key_from_cid_string(cid: &str) -> Result<String, CidError> {
    let cid: Cid = cid.try_into()?;
    Ok(multihash_key_from_cid(&cid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn cid_is_deterministic() {
        let bytes = hex!("deadbeef");
        let a = keccak256_cid(M_ETH_HEADER, &bytes);
        let b = keccak256_cid(M_ETH_HEADER, &bytes);
        assert_eq!(a, b);
        assert_eq!(a.codec(), M_ETH_HEADER);
        assert_eq!(a.hash().code(), KECCAK_256);
        assert_eq!(a.hash().digest(), keccak256(bytes).as_slice());
    }

    #[test]
    fn distinct_codecs_yield_distinct_cids() {
        let bytes = hex!("deadbeef");
        assert_ne!(keccak256_cid(M_ETH_TX, &bytes), keccak256_cid(M_ETH_TX_RECEIPT, &bytes));
    }

    #[test]
    fn multihash_key_roundtrips_through_cid_string() {
        let cid = keccak256_cid(M_ETH_STATE_TRIE, b"leaf bytes");
        let key = multihash_key_from_cid(&cid);
        assert!(key.starts_with('/'));
        assert_eq!(multihash_key_from_cid_string(&cid.to_string()).unwrap(), key);
    }

    #[test]
    fn multihash_key_ignores_codec() {
        // The key is derived from the hash alone, so the same bytes under different codecs map
        // to the same blob.
        let tx = keccak256_cid(M_ETH_TX, b"same bytes");
        let rct = keccak256_cid(M_ETH_TX_RECEIPT, b"same bytes");
        assert_eq!(multihash_key_from_cid(&tx), multihash_key_from_cid(&rct));
    }

    #[test]
    fn rejects_malformed_cid_strings() {
        assert!(multihash_key_from_cid_string("not a cid").is_err());
    }
}
