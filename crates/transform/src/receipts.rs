//! Derivation of receipt fields the wire encoding omits.

use crate::{TransformError, TransformResult};
use indexer_primitives::{ChainSpec, Receipt, TransactionSigned, B256};

/// Populates the receipt fields that are not RLP-encoded: transaction hash and index, per-
/// transaction gas used and, for contract creations, the deployed contract address derived from
/// the recovered sender.
pub fn derive_fields(
    chain_spec: &ChainSpec,
    _block_hash: B256,
    block_number: u64,
    transactions: &[TransactionSigned],
    receipts: &mut [Receipt],
) -> TransformResult<()> {
    if transactions.len() != receipts.len() {
        return Err(TransformError::FieldDerivation(format!(
            "block {} carries {} transactions but {} receipts",
            block_number,
            transactions.len(),
            receipts.len()
        )))
    }

    let signer = chain_spec.signer(block_number);
    let mut previous_cumulative_gas = 0u64;
    for (index, (receipt, transaction)) in receipts.iter_mut().zip(transactions).enumerate() {
        receipt.tx_hash = transaction.hash();
        receipt.transaction_index = index as u64;

        if receipt.cumulative_gas_used < previous_cumulative_gas {
            return Err(TransformError::FieldDerivation(format!(
                "cumulative gas decreases at receipt {index} of block {block_number}"
            )))
        }
        receipt.gas_used = receipt.cumulative_gas_used - previous_cumulative_gas;
        previous_cumulative_gas = receipt.cumulative_gas_used;

        // The deployed contract address is a function of the sender and its nonce.
        receipt.contract_address = if transaction.transaction.to.is_create() {
            let from = signer.sender(transaction)?;
            Some(from.create(transaction.transaction.nonce))
        } else {
            None
        };
    }

    Ok(())
}
