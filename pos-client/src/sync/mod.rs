//! Sync engine - drains the offline queue into the backend
//!
//! One pass delivers the queued orders strictly in enqueue order and stops at
//! the first order that does not go through, whether the transport failed or
//! the backend rejected it. Later orders are never sent ahead of an earlier
//! one. Everything left stays queued for the next trigger; there is no
//! backoff and no retry limit.
//!
//! Passes are mutually exclusive: [`SyncState`] is checked and flipped to
//! `Draining` under one lock, and a drop guard flips it back whatever way the
//! pass ends.

mod connectivity;
mod scheduler;
mod state;

pub use connectivity::{Connectivity, OnlineEdges, ReachabilityProbe, spawn_probe};
pub use scheduler::SyncScheduler;
pub use state::{SkipReason, SyncState};

use crate::queue::{QueueStore, QueuedOrder};
use crate::submitter::{OrderSubmitter, SubmitOutcome};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Why a pass stopped before the end of its snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Network error, timeout, HTTP status or unreadable response
    Transport(String),
    /// Backend refused the order
    Rejected(String),
    /// Delivered, but the removal could not be persisted
    Storage(String),
}

/// Result of one call to [`SyncEngine::process`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Gate closed, nothing attempted
    Skipped(SkipReason),
    /// Every snapshotted order was delivered
    Drained { delivered: usize },
    /// Stopped at `local_id`, which stays queued with everything behind it
    Halted {
        delivered: usize,
        local_id: String,
        reason: HaltReason,
    },
}

impl PassOutcome {
    pub fn delivered(&self) -> usize {
        match self {
            PassOutcome::Skipped(_) => 0,
            PassOutcome::Drained { delivered } | PassOutcome::Halted { delivered, .. } => {
                *delivered
            }
        }
    }
}

/// Queue and sync state as seen by the UI
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    pub state: SyncState,
    pub pending: usize,
    pub online: bool,
    /// Outcome of the most recent pass that attempted a delivery
    pub last_outcome: Option<PassOutcome>,
}

/// Delivers queued orders to the backend, one pass at a time
pub struct SyncEngine {
    queue: Arc<QueueStore>,
    submitter: Arc<dyn OrderSubmitter>,
    connectivity: Connectivity,
    state: Mutex<SyncState>,
    status_tx: watch::Sender<SyncStatus>,
}

/// Returns the engine to `Idle` when a pass ends, including on cancellation
struct DrainGuard<'a> {
    engine: &'a SyncEngine,
    /// Final status already published by `process`
    published: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.state.lock();
        *state = state.finish();
        drop(state);

        if !self.published {
            self.engine.publish(SyncState::Idle, None);
        }
    }
}

impl SyncEngine {
    pub fn new(
        queue: Arc<QueueStore>,
        submitter: Arc<dyn OrderSubmitter>,
        connectivity: Connectivity,
    ) -> Self {
        let (status_tx, _rx) = watch::channel(SyncStatus {
            state: SyncState::Idle,
            pending: queue.len(),
            online: connectivity.is_online(),
            last_outcome: None,
        });

        Self {
            queue,
            submitter,
            connectivity,
            state: Mutex::new(SyncState::Idle),
            status_tx,
        }
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Current status; no side effects
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            state: *self.state.lock(),
            pending: self.queue.len(),
            online: self.connectivity.is_online(),
            last_outcome: self.status_tx.borrow().last_outcome.clone(),
        }
    }

    /// Status updates, published when a pass starts and when it ends
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Run one drain pass if the gate allows it.
    ///
    /// Safe to call from any trigger at any time: while a pass is running,
    /// while offline, or with an empty queue it returns
    /// [`PassOutcome::Skipped`] without contacting the backend.
    pub async fn process(&self) -> PassOutcome {
        let (snapshot, mut guard) = {
            let mut state = self.state.lock();
            match state.begin(self.connectivity.is_online(), self.queue.len()) {
                Ok(next) => *state = next,
                Err(reason) => {
                    tracing::trace!(reason = %reason, "Drain skipped");
                    return PassOutcome::Skipped(reason);
                }
            }
            (
                self.queue.snapshot(),
                DrainGuard {
                    engine: self,
                    published: false,
                },
            )
        };

        tracing::debug!(pending = snapshot.len(), "Drain pass started");
        self.publish(SyncState::Draining, None);

        let outcome = self.drain(snapshot).await;

        match &outcome {
            PassOutcome::Drained { delivered } => {
                tracing::info!(delivered, "Offline queue drained");
            }
            PassOutcome::Halted {
                delivered,
                local_id,
                reason,
            } => {
                tracing::info!(
                    delivered,
                    local_id = %local_id,
                    pending = self.queue.len(),
                    reason = ?reason,
                    "Drain pass halted"
                );
            }
            PassOutcome::Skipped(_) => {}
        }

        // Final status goes out before the state returns to Idle
        self.publish(SyncState::Idle, Some(outcome.clone()));
        guard.published = true;
        drop(guard);
        outcome
    }

    async fn drain(&self, snapshot: Vec<QueuedOrder>) -> PassOutcome {
        let mut delivered = 0;

        for order in snapshot {
            let reason = match self.submitter.submit(&order.payload).await {
                Ok(SubmitOutcome::Accepted) => match self.queue.remove(&order.local_id) {
                    Ok(_) => {
                        delivered += 1;
                        tracing::info!(local_id = %order.local_id, "Order synced");
                        continue;
                    }
                    Err(e) => {
                        tracing::error!(
                            local_id = %order.local_id,
                            error = %e,
                            "Order delivered but could not be removed from the queue"
                        );
                        HaltReason::Storage(e.to_string())
                    }
                },
                Ok(SubmitOutcome::Rejected { message }) => {
                    tracing::error!(
                        local_id = %order.local_id,
                        message = %message,
                        "Backend rejected queued order, sync paused"
                    );
                    HaltReason::Rejected(message)
                }
                Err(e) => {
                    tracing::warn!(
                        local_id = %order.local_id,
                        error = %e,
                        "Unstable connection, sync paused"
                    );
                    HaltReason::Transport(e.to_string())
                }
            };

            return PassOutcome::Halted {
                delivered,
                local_id: order.local_id,
                reason,
            };
        }

        PassOutcome::Drained { delivered }
    }

    fn publish(&self, state: SyncState, outcome: Option<PassOutcome>) {
        let pending = self.queue.len();
        let online = self.connectivity.is_online();
        self.status_tx.send_modify(|status| {
            status.state = state;
            status.pending = pending;
            status.online = online;
            if outcome.is_some() {
                status.last_outcome = outcome;
            }
        });
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &*self.state.lock())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
