//! redb-backed slot storage
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `slots` | slot name | raw bytes | Queue list, device token |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns the data survives a crash or power loss, and the file is always
//! in a consistent state. Tablets running the POS get unplugged.

use super::{SlotStorage, StorageResult};
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table for named slots: key = slot name, value = raw bytes
const SLOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("slots");

/// Slot storage backed by redb
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SLOTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl SlotStorage for RedbStorage {
    fn read(&self, slot: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SLOTS_TABLE)?;
        Ok(table.get(slot)?.map(|guard| guard.value().to_vec()))
    }

    fn write(&self, slot: &str, value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SLOTS_TABLE)?;
            table.insert(slot, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SLOTS_TABLE)?;
            table.remove(slot)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_overwrite() {
        let storage = RedbStorage::open_in_memory().unwrap();
        assert!(storage.read("order_queue").unwrap().is_none());

        storage.write("order_queue", b"[1]").unwrap();
        storage.write("order_queue", b"[1,2]").unwrap();
        assert_eq!(storage.read("order_queue").unwrap(), Some(b"[1,2]".to_vec()));
    }

    #[test]
    fn test_remove_missing_slot_is_noop() {
        let storage = RedbStorage::open_in_memory().unwrap();
        storage.remove("device_token").unwrap();
        storage.write("device_token", b"abc").unwrap();
        storage.remove("device_token").unwrap();
        assert!(storage.read("device_token").unwrap().is_none());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.redb");

        {
            let storage = RedbStorage::open(&path).unwrap();
            storage.write("device_token", b"abc").unwrap();
        }

        let storage = RedbStorage::open(&path).unwrap();
        assert_eq!(storage.read("device_token").unwrap(), Some(b"abc".to_vec()));
    }
}
