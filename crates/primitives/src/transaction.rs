use crate::Signature;
use alloy_primitives::{keccak256, Address, Bytes, ChainId, TxHash, B256, U256};
use alloy_rlp::{length_of_length, Decodable, Encodable, Error as RlpError, Header};
use bytes::Buf;

/// Legacy transaction, the only kind carried by the pre-typed-envelope payloads this pipeline
/// ingests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TxLegacy {
    /// Added as EIP-155: Simple replay attack protection
    pub chain_id: Option<ChainId>,
    /// A scalar value equal to the number of transactions sent by the sender; formally Tn.
    pub nonce: u64,
    /// A scalar value equal to the number of Wei to be paid per unit of gas; formally Tp.
    pub gas_price: u128,
    /// A scalar value equal to the maximum amount of gas that should be used in executing
    /// this transaction; formally Tg.
    pub gas_limit: u64,
    /// The 160-bit address of the message call’s recipient or, for a contract creation
    /// transaction, ∅; formally Tt.
    pub to: TransactionKind,
    /// A scalar value equal to the number of Wei to be transferred to the message call’s
    /// recipient or, in the case of contract creation, as an endowment; formally Tv.
    pub value: U256,
    /// Input has two uses depending if transaction is Create or Call: init code for CREATE,
    /// message call data otherwise; formally Td.
    pub input: Bytes,
}

impl TxLegacy {
    /// Outputs the length of the transaction fields, without a RLP header or EIP-155 fields.
    pub(crate) fn fields_len(&self) -> usize {
        self.nonce.length() +
            self.gas_price.length() +
            self.gas_limit.length() +
            self.to.length() +
            self.value.length() +
            self.input.0.length()
    }

    /// Encodes the transaction fields into the desired buffer, without a RLP header or EIP-155
    /// fields.
    pub(crate) fn encode_fields(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.0.encode(out);
    }

    /// Outputs the length of EIP-155 fields: the chain ID and two zeroes, if a chain ID is
    /// present.
    fn eip155_fields_len(chain_id: Option<ChainId>) -> usize {
        chain_id.map_or(0, |id| id.length() + 2)
    }

    /// Encodes the EIP-155 chain ID and two zeroes, if a chain ID is present.
    fn encode_eip155_fields(chain_id: Option<ChainId>, out: &mut dyn alloy_rlp::BufMut) {
        if let Some(id) = chain_id {
            id.encode(out);
            0x00u8.encode(out);
            0x00u8.encode(out);
        }
    }

    /// Heavy operation that hashes the RLP encoding used for signing, with the EIP-155 fields
    /// appended when `chain_id` is present.
    pub fn signature_hash(&self, chain_id: Option<ChainId>) -> B256 {
        let payload_length = self.fields_len() + Self::eip155_fields_len(chain_id);
        let mut buf = Vec::with_capacity(payload_length + length_of_length(payload_length));
        Header { list: true, payload_length }.encode(&mut buf);
        self.encode_fields(&mut buf);
        Self::encode_eip155_fields(chain_id, &mut buf);
        keccak256(&buf)
    }
}

/// Whether or not the transaction is a contract creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionKind {
    /// A transaction that creates a contract.
    #[default]
    Create,
    /// A transaction that calls a contract or transfers value.
    Call(Address),
}

impl TransactionKind {
    /// Returns the address of the recipient, or `None` for a contract creation.
    pub const fn to(&self) -> Option<&Address> {
        match self {
            Self::Create => None,
            Self::Call(to) => Some(to),
        }
    }

    /// Returns true if the transaction is a contract creation.
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::Create)
    }
}

impl Encodable for TransactionKind {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        match self {
            Self::Call(to) => to.encode(out),
            Self::Create => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Call(to) => to.length(),
            Self::Create => 1,
        }
    }
}

impl Decodable for TransactionKind {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        if let Some(&first) = buf.first() {
            if first == alloy_rlp::EMPTY_STRING_CODE {
                buf.advance(1);
                Ok(Self::Create)
            } else {
                Ok(Self::Call(Address::decode(buf)?))
            }
        } else {
            Err(RlpError::InputTooShort)
        }
    }
}

/// Signed transaction, together with its keccak hash over the full RLP encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TransactionSigned {
    /// Transaction hash
    pub hash: TxHash,
    /// The transaction signature values
    pub signature: Signature,
    /// Raw transaction info
    pub transaction: TxLegacy,
}

impl TransactionSigned {
    /// Calculate transaction hash, setup transaction from transaction and its signature.
    pub fn from_transaction_and_signature(transaction: TxLegacy, signature: Signature) -> Self {
        let mut signed = Self { hash: Default::default(), signature, transaction };
        signed.hash = keccak256(alloy_rlp::encode(&signed));
        signed
    }

    /// Transaction hash. Used to identify the transaction.
    pub const fn hash(&self) -> TxHash {
        self.hash
    }

    /// Returns the recipient, or `None` for a contract creation.
    pub const fn to(&self) -> Option<&Address> {
        self.transaction.to.to()
    }

    /// Returns the transaction input.
    pub const fn input(&self) -> &Bytes {
        &self.transaction.input
    }

    /// Output the length of the `v`, `r`, `s` fields together with the transaction fields,
    /// without the enclosing RLP list header.
    fn payload_len(&self) -> usize {
        self.transaction.fields_len() +
            self.signature.payload_len_with_eip155_chain_id(self.transaction.chain_id)
    }
}

impl Encodable for TransactionSigned {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.payload_len();
        Header { list: true, payload_length }.encode(out);
        self.transaction.encode_fields(out);
        self.signature.encode_with_eip155_chain_id(out, self.transaction.chain_id);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_len();
        payload_length + length_of_length(payload_length)
    }
}

impl Decodable for TransactionSigned {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let original_encoding = *buf;

        let header = Header::decode(buf)?;
        if !header.list {
            return Err(RlpError::UnexpectedString)
        }
        let remaining_len = buf.len();
        if header.payload_length > remaining_len {
            return Err(RlpError::InputTooShort)
        }

        let mut transaction = TxLegacy {
            chain_id: None,
            nonce: Decodable::decode(buf)?,
            gas_price: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            to: Decodable::decode(buf)?,
            value: Decodable::decode(buf)?,
            input: Decodable::decode(buf)?,
        };
        let (signature, chain_id) = Signature::decode_with_eip155_chain_id(buf)?;
        transaction.chain_id = chain_id;

        let consumed = remaining_len - buf.len();
        if consumed != header.payload_length {
            return Err(RlpError::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            })
        }

        let tx_length = header.length() + header.payload_length;
        let hash = keccak256(&original_encoding[..tx_length]);
        Ok(Self { hash, signature, transaction })
    }
}

/// Recovers transaction senders according to the signature scheme active at a given block, the
/// way the upstream chain derives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signer {
    /// Pre-homestead scheme: no EIP-2 malleability check, no chain ID.
    Frontier,
    /// Homestead scheme: rejects high `s` values per EIP-2.
    Homestead,
    /// EIP-155 scheme: replay-protected hashing over the chain ID.
    Eip155 {
        /// The chain ID mixed into the signature hash.
        chain_id: ChainId,
    },
}

impl Signer {
    /// Recover the sender address of a signed transaction under this scheme.
    pub fn sender(&self, tx: &TransactionSigned) -> Result<Address, SignerError> {
        match *self {
            Self::Frontier => tx
                .signature
                .recover_signer_unchecked(tx.transaction.signature_hash(None))
                .ok_or(SignerError::RecoveryFailed { hash: tx.hash }),
            Self::Homestead => tx
                .signature
                .recover_signer(tx.transaction.signature_hash(None))
                .ok_or(SignerError::RecoveryFailed { hash: tx.hash }),
            Self::Eip155 { chain_id } => {
                // Pre-EIP-155 signatures remain valid after the fork.
                match tx.transaction.chain_id {
                    None => tx
                        .signature
                        .recover_signer(tx.transaction.signature_hash(None))
                        .ok_or(SignerError::RecoveryFailed { hash: tx.hash }),
                    Some(tx_chain_id) if tx_chain_id == chain_id => tx
                        .signature
                        .recover_signer(tx.transaction.signature_hash(Some(chain_id)))
                        .ok_or(SignerError::RecoveryFailed { hash: tx.hash }),
                    Some(tx_chain_id) => {
                        Err(SignerError::ChainIdMismatch { tx: tx_chain_id, signer: chain_id })
                    }
                }
            }
        }
    }
}

/// Errors raised while recovering transaction senders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// Public key recovery failed, e.g. due to an invalid or malleable signature.
    #[error("could not recover sender of transaction {hash}")]
    RecoveryFailed {
        /// Hash of the offending transaction.
        hash: TxHash,
    },
    /// The transaction is replay-protected for a different chain.
    #[error("transaction chain id {tx} does not match signer chain id {signer}")]
    ChainIdMismatch {
        /// Chain ID carried by the transaction's `v` value.
        tx: ChainId,
        /// Chain ID the signer was constructed for.
        signer: ChainId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};
    use hex_literal::hex;

    #[test]
    fn decode_raw_legacy_and_recover() {
        // Mainnet block 46170, a pre-homestead transaction with a high `s` value:
        // https://etherscan.io/getRawTx?tx=0x9e6e19637bb625a8ff3d052b7c2fe57dc78c55a15d258d77c43d5a9c160b0384
        let raw = hex!("f86d8085746a52880082520894c93f2250589a6563f5359051c1ea25746549f0d889208686e75e903bc000801ba034b6fdc33ea520e8123cf5ac4a9ff476f639cab68980cd9366ccae7aef437ea0a0e517caa5f50e27ca0d1e9a92c503b4ccb039680c6d9d0c71203ed611ea4feb33");
        let tx = TransactionSigned::decode(&mut &raw[..]).unwrap();

        assert_eq!(
            tx.hash(),
            b256!("9e6e19637bb625a8ff3d052b7c2fe57dc78c55a15d258d77c43d5a9c160b0384")
        );
        assert_eq!(tx.transaction.chain_id, None);
        assert_eq!(tx.to(), Some(&address!("c93f2250589a6563f5359051c1ea25746549f0d8")));

        // The frontier scheme accepts the malleable signature, homestead rejects it.
        assert!(Signer::Frontier.sender(&tx).is_ok());
        assert!(matches!(
            Signer::Homestead.sender(&tx),
            Err(SignerError::RecoveryFailed { .. })
        ));

        // Re-encoding reproduces the wire bytes.
        assert_eq!(alloy_rlp::encode(&tx), raw);
    }

    #[test]
    fn recover_eip155_signer() {
        let signer = address!("398137383b3d25c92898c656696e41950e47316b");
        let hash = b256!("bb3a336e3f823ec18197f1e13ee875700f08f03e2cab75f0d0b118dabb44cba0");

        let transaction = TxLegacy {
            chain_id: Some(1),
            nonce: 0x18,
            gas_price: 0xfa56ea00,
            gas_limit: 119902,
            to: TransactionKind::Call(address!("06012c8cf97bead5deae237070f9587f8e7a266d")),
            value: U256::from(0x1c6bf526340000u64),
            input: hex!("f7d8c88300000000000000000000000000000000000000000000000000000000000cee6100000000000000000000000000000000000000000000000000000000000ac3e1").into(),
        };
        let signature = Signature {
            r: U256::from_be_bytes(hex!(
                "2a378831cf81d99a3f06a18ae1b6ca366817ab4d88a70053c41d7a8f0368e031"
            )),
            s: U256::from_be_bytes(hex!(
                "450d831a05b6e418724436c05c155e0a1b7b921015d0fbc2f667aed709ac4fb5"
            )),
            odd_y_parity: false,
        };

        let signed = TransactionSigned::from_transaction_and_signature(transaction, signature);
        assert_eq!(signed.hash(), hash);
        assert_eq!(Signer::Eip155 { chain_id: 1 }.sender(&signed), Ok(signer));

        // A signer pinned to a different chain refuses the transaction.
        assert_eq!(
            Signer::Eip155 { chain_id: 5 }.sender(&signed),
            Err(SignerError::ChainIdMismatch { tx: 1, signer: 5 })
        );
    }

    #[test]
    fn signed_roundtrip_preserves_hash() {
        let transaction = TxLegacy {
            chain_id: Some(1),
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: TransactionKind::Call(address!("3535353535353535353535353535353535353535")),
            value: U256::from(10u64).pow(U256::from(18u64)),
            input: Bytes::default(),
        };
        let signature = Signature {
            r: U256::from_be_bytes(hex!(
                "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
            )),
            s: U256::from_be_bytes(hex!(
                "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
            )),
            odd_y_parity: false,
        };

        let signed = TransactionSigned::from_transaction_and_signature(transaction, signature);
        let encoded = alloy_rlp::encode(&signed);
        let decoded = TransactionSigned::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(signed, decoded);
    }

    #[test]
    fn create_kind_roundtrip() {
        let kind = TransactionKind::Create;
        let encoded = alloy_rlp::encode(&kind);
        assert_eq!(encoded, [alloy_rlp::EMPTY_STRING_CODE]);
        assert_eq!(TransactionKind::decode(&mut encoded.as_slice()).unwrap(), kind);
        assert!(kind.is_create());
    }
}
