//! UI-facing entry point
//!
//! The POS screen hands over a typed [`OrderRequest`]; validation happens
//! here, and only a valid payload reaches the queue.

use crate::queue::{QueueError, QueueStore, QueuedOrder};
use crate::sync::{SyncEngine, SyncStatus};
use shared::{OrderRequest, OrderValidationError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum PosError {
    #[error("Invalid order: {0}")]
    Validation(#[from] OrderValidationError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Order registration and queue status for the UI
#[derive(Debug, Clone)]
pub struct PosService {
    queue: Arc<QueueStore>,
    engine: Arc<SyncEngine>,
}

impl PosService {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            queue: engine.queue().clone(),
            engine,
        }
    }

    /// Validate and durably queue an order; delivery happens in the background.
    ///
    /// `Ok` means the order survived to storage, not that the backend has it.
    pub fn register_order(&self, order: OrderRequest) -> Result<QueuedOrder, PosError> {
        let payload = order.into_payload()?;
        Ok(self.queue.enqueue(payload)?)
    }

    pub fn pending_orders(&self) -> usize {
        self.queue.len()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.engine.status()
    }

    /// Notified when a drain pass starts or ends
    pub fn watch_sync(&self) -> watch::Receiver<SyncStatus> {
        self.engine.subscribe()
    }
}
