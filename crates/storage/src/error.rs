/// Result alias for [`StorageError`].
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors possible when interacting with the relational store or the blob store beneath it.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A statement failed or the connection broke.
    #[error(transparent)]
    Sql(#[from] tokio_postgres::Error),

    /// The pool could not hand out a connection.
    #[error(transparent)]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The pool could not be constructed from the given configuration.
    #[error("invalid database configuration: {0}")]
    Config(String),
}
