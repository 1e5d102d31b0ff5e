use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid document key: {0:?}")]
    InvalidKey(String),

    #[error("Registry store error: {0}")]
    Redb(#[from] redb::Error),

    #[error("Registry store open failed: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Registry store transaction failed: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Registry store table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Registry store storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Registry store commit failed: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Issue log error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Issue serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
