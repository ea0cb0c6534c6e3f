//! Durable slot storage
//!
//! A slot is one named byte value. The queue keeps its whole serialized list
//! in a single slot and overwrites it on every mutation; the device token
//! lives in another.
//!
//! Operations are synchronous: a write has either reached durable storage or
//! failed by the time it returns.

mod memory;
mod redb_store;

pub use self::memory::MemoryStorage;
pub use self::redb_store::RedbStorage;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Named-slot persistence backend
pub trait SlotStorage: Send + Sync {
    /// Read a slot; `None` if it was never written or has been removed
    fn read(&self, slot: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Overwrite a slot durably
    fn write(&self, slot: &str, value: &[u8]) -> StorageResult<()>;

    /// Remove a slot (no-op if absent)
    fn remove(&self, slot: &str) -> StorageResult<()>;
}
