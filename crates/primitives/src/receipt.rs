use alloy_primitives::{Address, Bloom, Log, TxHash, B256};
use alloy_rlp::{length_of_length, Decodable, Encodable, Error as RlpError, Header};

/// Receipt containing the consensus fields of a transaction execution, plus the fields the
/// payload encoding omits and the transform stage re-computes from chain context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Receipt {
    /// Intermediate state root, only present in pre-byzantium receipts; formally Rσ.
    pub post_state: Option<B256>,
    /// Status code of the transaction, EIP-658; replaces the state root in byzantium and later
    /// receipts.
    pub success: bool,
    /// Gas used in the block up to and including this transaction; formally Ru.
    pub cumulative_gas_used: u64,
    /// Bloom filter composed from the logs; formally Rb.
    pub bloom: Bloom,
    /// Log entries emitted during execution; formally Rl.
    pub logs: Vec<Log>,

    // The fields below are not part of the consensus encoding. They are derived from the
    // enclosing block before indexing.
    /// Hash of the transaction this receipt belongs to.
    pub tx_hash: TxHash,
    /// Position of the transaction within its block.
    pub transaction_index: u64,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
    /// Address of the created contract, if the transaction was a contract creation.
    pub contract_address: Option<Address>,
}

impl Receipt {
    fn payload_len(&self) -> usize {
        let first = match self.post_state {
            Some(root) => root.length(),
            None => self.success.length(),
        };
        first + self.cumulative_gas_used.length() + self.bloom.length() + self.logs.length()
    }
}

impl Encodable for Receipt {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        Header { list: true, payload_length: self.payload_len() }.encode(out);
        match self.post_state {
            Some(root) => root.encode(out),
            None => self.success.encode(out),
        }
        self.cumulative_gas_used.encode(out);
        self.bloom.encode(out);
        self.logs.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_len();
        payload_length + length_of_length(payload_length)
    }
}

impl Decodable for Receipt {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let rlp_head = Header::decode(buf)?;
        if !rlp_head.list {
            return Err(RlpError::UnexpectedString)
        }
        let started_len = buf.len();

        // The first field is a 32-byte intermediate state root for pre-byzantium receipts and a
        // status code afterwards.
        let (post_state, success) = if buf.first() == Some(&0xa0) {
            (Some(B256::decode(buf)?), true)
        } else {
            (None, bool::decode(buf)?)
        };
        let cumulative_gas_used = Decodable::decode(buf)?;
        let bloom = Decodable::decode(buf)?;
        let logs = Decodable::decode(buf)?;

        let consumed = started_len - buf.len();
        if consumed != rlp_head.payload_length {
            return Err(RlpError::ListLengthMismatch {
                expected: rlp_head.payload_length,
                got: consumed,
            })
        }

        Ok(Self {
            post_state,
            success,
            cumulative_gas_used,
            bloom,
            logs,
            ..Default::default()
        })
    }
}
