use super::{SlotStorage, StorageResult};
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-process slot storage (tests, ephemeral sessions)
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot
    pub fn with_slot(self, slot: &str, value: impl Into<Vec<u8>>) -> Self {
        self.slots.lock().insert(slot.to_string(), value.into());
        self
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, slot: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.slots.lock().get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &[u8]) -> StorageResult<()> {
        self.slots.lock().insert(slot.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, slot: &str) -> StorageResult<()> {
        self.slots.lock().remove(slot);
        Ok(())
    }
}
