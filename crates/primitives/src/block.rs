use crate::{Header, TransactionSigned};
use alloy_primitives::B256;
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// Ethereum full block: header, transactions and ommer headers, as carried by the payload's
/// `block_rlp` field.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct Block {
    /// Block header.
    pub header: Header,
    /// Transactions in this block.
    pub transactions: Vec<TransactionSigned>,
    /// Ommer headers included by this block.
    pub ommers: Vec<Header>,
}

impl Block {
    /// Keccak hash of the block header.
    pub fn hash(&self) -> B256 {
        self.header.hash_slow()
    }

    /// The height of this block.
    pub const fn number(&self) -> u64 {
        self.header.number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Decodable;
    use hex_literal::hex;

    #[test]
    fn decode_block_with_single_transaction() {
        let data = hex!("f90262f901f9a092230ce5476ae868e98c7979cfc165a93f8b6ad1922acf2df62e340916efd49da01dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347942adc25665018aa1fe0e6bc666dac8fc2697ff9baa02307107a867056ca33b5087e77c4174f47625e48fb49f1c70ced34890ddd88f3a08151d548273f6683169524b66ca9fe338b9ce42bc3540046c828fd939ae23bcba0c598f69a5674cae9337261b669970e24abc0b46e6d284372a239ec8ccbf20b0ab901000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000083020000018502540be40082a8618203e800a00000000000000000000000000000000000000000000000000000000000000000880000000000000000f863f861800a8405f5e10094100000000000000000000000000000000000000080801ba07e09e26678ed4fac08a249ebe8ed680bf9051a5e14ad223e4b2b9d26e0208f37a05f6e3f188e3e6eab7d7d3b6568f5eac7d687b08d307d3154ccd8c87b4630509bc0");
        let block = Block::decode(&mut data.as_slice()).unwrap();

        assert_eq!(block.number(), 1);
        assert_eq!(block.transactions.len(), 1);
        assert!(block.ommers.is_empty());
        assert_eq!(block.header.gas_limit, 0x02540be400);

        // Re-encoding reproduces the wire bytes, and the hash is stable.
        assert_eq!(alloy_rlp::encode(&block), data);
        assert_eq!(block.hash(), block.header.hash_slow());
    }
}
