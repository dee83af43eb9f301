use indexer_ipld::IpldError;
use indexer_primitives::SignerError;
use indexer_storage::StorageError;

/// Result alias for [`TransformError`].
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors possible while transforming a state-diff payload into index rows.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A payload component was not valid RLP.
    #[error("payload decode failed: {0}")]
    Decode(#[from] alloy_rlp::Error),

    /// The per-position IPLD lists do not line up with the payload's receipts.
    #[error(
        "expected number of transactions ({transactions}), transaction trie nodes \
         ({tx_trie_nodes}), receipts ({receipts}), and receipt trie nodes \
         ({receipt_trie_nodes}) to be equal"
    )]
    ShapeMismatch {
        /// Number of transaction nodes built.
        transactions: usize,
        /// Number of transaction-trie leaves built.
        tx_trie_nodes: usize,
        /// Number of receipt nodes built.
        receipts: usize,
        /// Number of receipt-trie leaves built.
        receipt_trie_nodes: usize,
    },

    /// Receipt fields absent from the wire encoding could not be re-derived.
    #[error("receipt field derivation failed: {0}")]
    FieldDerivation(String),

    /// A transaction sender could not be recovered.
    #[error(transparent)]
    Sender(#[from] SignerError),

    /// The blob store or the relational index failed.
    #[error(transparent)]
    Store(#[from] StorageError),

    /// The transform was cancelled before completion.
    #[error("transform cancelled")]
    Cancelled,
}

impl TransformError {
    /// Whether the error marks the payload itself as bad, as opposed to a transient
    /// infrastructure failure worth retrying.
    pub const fn is_payload_fault(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) |
                Self::ShapeMismatch { .. } |
                Self::FieldDerivation(_) |
                Self::Sender(_)
        )
    }
}

impl From<IpldError> for TransformError {
    fn from(err: IpldError) -> Self {
        match err {
            IpldError::ReceiptCountMismatch { transactions, receipts } => Self::ShapeMismatch {
                transactions,
                tx_trie_nodes: transactions,
                receipts,
                receipt_trie_nodes: receipts,
            },
        }
    }
}
