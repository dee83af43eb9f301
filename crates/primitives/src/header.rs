use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// Ethereum block header.
///
/// The `base_fee_per_gas` field is optionally included at the end of the RLP
/// encoded message for post-London headers.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
#[rlp(trailing)]
pub struct Header {
    /// The Keccak 256-bit hash of the parent block's header, in its entirety; formally Hp.
    pub parent_hash: B256,
    /// The Keccak 256-bit hash of the ommers list portion of this block; formally Ho.
    pub ommers_hash: B256,
    /// The 160-bit address to which all fees collected from the successful mining of this block
    /// be transferred; formally Hc.
    pub beneficiary: Address,
    /// The Keccak 256-bit hash of the root node of the state trie, after all transactions are
    /// executed and finalisations applied; formally Hr.
    pub state_root: B256,
    /// The Keccak 256-bit hash of the root node of the trie structure populated with each
    /// transaction in the transactions list portion of the block; formally Ht.
    pub transactions_root: B256,
    /// The Keccak 256-bit hash of the root node of the trie structure populated with the receipts
    /// of each transaction in the transactions list portion of the block; formally He.
    pub receipts_root: B256,
    /// The Bloom filter composed from indexable information (logger address and log topics)
    /// contained in each log entry from the receipt of each transaction in the transactions list;
    /// formally Hb.
    pub logs_bloom: Bloom,
    /// A scalar value corresponding to the difficulty level of this block. This can be calculated
    /// from the previous block's difficulty level and the timestamp; formally Hd.
    pub difficulty: U256,
    /// A scalar value equal to the number of ancestor blocks. The genesis block has a number of
    /// zero; formally Hi.
    pub number: u64,
    /// A scalar value equal to the current limit of gas expenditure per block; formally Hl.
    pub gas_limit: u64,
    /// A scalar value equal to the total gas used in transactions in this block; formally Hg.
    pub gas_used: u64,
    /// A scalar value equal to the reasonable output of Unix's time() at this block's inception;
    /// formally Hs.
    pub timestamp: u64,
    /// An arbitrary byte array containing data relevant to this block. This must be 32 bytes or
    /// fewer; formally Hx.
    pub extra_data: Bytes,
    /// A 256-bit hash which, combined with the nonce, proves that a sufficient amount of
    /// computation has been carried out on this block; formally Hm.
    pub mix_hash: B256,
    /// A 64-bit value which, combined with the mixhash, proves that a sufficient amount of
    /// computation has been carried out on this block; formally Hn.
    pub nonce: B64,
    /// A scalar representing EIP-1559 base fee which can move up or down each block according to
    /// a formula which is a function of gas used in parent block and gas target of parent block.
    pub base_fee_per_gas: Option<u64>,
}

impl Header {
    /// Heavy function that will calculate the hash of data, i.e. the keccak of the RLP encoded
    /// header.
    pub fn hash_slow(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bloom, bytes, hex};
    use alloy_rlp::Decodable;

    // A pre-London proof-of-work header shape.
    fn pow_header() -> Header {
        Header {
            parent_hash: b256!("8a339398c23ebc3e0e3e3266c8f819dbd8cdd7d1c70f8a4d902a780bf0237321"),
            ommers_hash: b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"),
            beneficiary: address!("bb7b8287f3f0a933474a79eae42cbca977791171"),
            state_root: b256!("5b5683d9e59e7fca1b84f6e0bfa2ceef7e0b5a2ce608cf5f4c0b8e113e3d4d74"),
            transactions_root: b256!(
                "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
            ),
            receipts_root: b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"),
            logs_bloom: bloom!(
                "00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000"
            ),
            difficulty: U256::from(0x12ac29990fu64),
            number: 0x9dff,
            gas_limit: 0x520b,
            gas_used: 0,
            timestamp: 0x55c9ea07,
            extra_data: bytes!("476574682f76312e302e312f6c696e75782f676f312e342e32"),
            mix_hash: b256!("1ce4be083d533b8309ab044be930129b164e5a23e59572b9e1ee0f1940f1e164"),
            nonce: B64::new(hex!("55d23e7ff8c260bb")),
            base_fee_per_gas: None,
        }
    }

    #[test]
    fn header_rlp_roundtrip() {
        let header = pow_header();
        let encoded = alloy_rlp::encode(&header);
        let decoded = Header::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn trailing_base_fee_roundtrip() {
        let header = Header { base_fee_per_gas: Some(7), ..pow_header() };
        let encoded = alloy_rlp::encode(&header);
        let decoded = Header::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded.base_fee_per_gas, Some(7));
    }

    #[test]
    fn header_hash_is_keccak_of_rlp() {
        let header = pow_header();
        let encoded = alloy_rlp::encode(&header);
        assert_eq!(header.hash_slow(), keccak256(&encoded));
        // Hashing twice yields the same digest.
        assert_eq!(header.hash_slow(), header.hash_slow());
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let header = pow_header();
        let encoded = alloy_rlp::encode(&header);
        let truncated = &encoded[..encoded.len() - 4];
        assert!(Header::decode(&mut hex::decode("c0").unwrap().as_slice()).is_err());
        assert!(Header::decode(&mut &truncated[..]).is_err());
    }
}
