//! Offline order queue
//!
//! Ordered, durable holding area for orders the backend has not confirmed
//! yet. The full list lives in one storage slot and is rewritten on every
//! mutation (write-through): the in-memory list only changes after the
//! write has succeeded, so memory and storage never disagree.

use crate::storage::{SlotStorage, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::OrderPayload;
use shared::util::{next_millis_id, now_millis};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;

/// Storage slot holding the serialized queue
pub const QUEUE_SLOT: &str = "order_queue";

/// An order waiting for delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedOrder {
    /// Local identifier, only used to remove the entry after delivery
    #[serde(rename = "idLocal")]
    pub local_id: String,
    /// Backend-bound body
    pub payload: OrderPayload,
    /// Enqueue time (ms since epoch)
    #[serde(rename = "queuedAt", default)]
    pub queued_at: i64,
}

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to persist queue: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode queue: {0}")]
    Serialization(#[from] serde_json::Error),
}

struct QueueInner {
    entries: Vec<QueuedOrder>,
    /// Highest local id handed out so far
    last_id: i64,
}

/// Durable FIFO of pending order submissions
pub struct QueueStore {
    storage: Arc<dyn SlotStorage>,
    inner: Mutex<QueueInner>,
    sync_trigger: Arc<Notify>,
}

impl QueueStore {
    /// Restore the queue from storage.
    ///
    /// A missing, unreadable or corrupt slot yields an empty queue; startup
    /// never fails because of it.
    pub fn open(storage: Arc<dyn SlotStorage>) -> Self {
        let entries = Self::load(storage.as_ref());
        let last_id = entries
            .iter()
            .filter_map(|entry| entry.local_id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        if !entries.is_empty() {
            tracing::info!(pending = entries.len(), "Restored offline order queue");
        }

        Self {
            storage,
            inner: Mutex::new(QueueInner { entries, last_id }),
            sync_trigger: Arc::new(Notify::new()),
        }
    }

    fn load(storage: &dyn SlotStorage) -> Vec<QueuedOrder> {
        let bytes = match storage.read(QUEUE_SLOT) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read queue slot, starting empty");
                return Vec::new();
            }
        };

        let entries: Vec<QueuedOrder> = match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt queue slot, starting empty");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let before = entries.len();
        let entries: Vec<_> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.local_id.clone()))
            .collect();
        if entries.len() != before {
            tracing::warn!(
                dropped = before - entries.len(),
                "Dropped queue entries with duplicate local ids"
            );
        }

        entries
    }

    /// Append an order and persist the whole queue before returning.
    ///
    /// On success a drain attempt is signalled (fire-and-forget). If the
    /// write fails the order is not queued and the error is returned.
    pub fn enqueue(&self, payload: OrderPayload) -> Result<QueuedOrder, QueueError> {
        let order = {
            let mut inner = self.inner.lock();
            let id = next_millis_id(inner.last_id);
            let order = QueuedOrder {
                local_id: id.to_string(),
                payload,
                queued_at: now_millis(),
            };

            let mut next = inner.entries.clone();
            next.push(order.clone());
            self.persist(&next)?;

            inner.entries = next;
            inner.last_id = id;
            order
        };

        tracing::info!(local_id = %order.local_id, pending = self.len(), "Order queued");
        self.sync_trigger.notify_one();
        Ok(order)
    }

    /// Remove a delivered order, keeping the relative order of the rest.
    ///
    /// Returns `Ok(false)` without touching storage if the id is not queued.
    pub fn remove(&self, local_id: &str) -> Result<bool, QueueError> {
        let mut inner = self.inner.lock();
        let Some(index) = inner.entries.iter().position(|e| e.local_id == local_id) else {
            return Ok(false);
        };

        let mut next = inner.entries.clone();
        next.remove(index);
        self.persist(&next)?;

        inner.entries = next;
        Ok(true)
    }

    /// Copy of the current entries in delivery order
    pub fn snapshot(&self) -> Vec<QueuedOrder> {
        self.inner.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Signalled after every successful enqueue
    pub fn sync_trigger(&self) -> Arc<Notify> {
        self.sync_trigger.clone()
    }

    fn persist(&self, entries: &[QueuedOrder]) -> Result<(), QueueError> {
        let bytes = serde_json::to_vec(entries)?;
        self.storage.write(QUEUE_SLOT, &bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for QueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStore")
            .field("pending", &self.len())
            .finish_non_exhaustive()
    }
}
