//! Drain triggers
//!
//! Every trigger calls the same gated [`SyncEngine::process`]:
//! - an order was enqueued (queue notify)
//! - the backend became reachable again (connectivity edge)
//! - the periodic safety-net timer fired
//!
//! Passes run inline in this loop. Triggers arriving meanwhile are coalesced
//! (notify permit, watch flag, skipped ticks) and handled right after.

use super::{Connectivity, SyncEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    enqueue_notify: Arc<Notify>,
    connectivity: Connectivity,
    interval: Duration,
    shutdown: CancellationToken,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, interval: Duration, shutdown: CancellationToken) -> Self {
        let enqueue_notify = engine.queue().sync_trigger();
        let connectivity = engine.connectivity().clone();
        Self {
            engine,
            enqueue_notify,
            connectivity,
            interval,
            shutdown,
        }
    }

    /// Main loop: one pass at startup, then one per trigger until shutdown
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            "Sync scheduler started"
        );

        let mut online_edges = self.connectivity.online_edges();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the startup pass covers it
        ticker.tick().await;

        self.run_pass("startup").await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Sync scheduler received shutdown signal");
                    return;
                }
                _ = self.enqueue_notify.notified() => {
                    self.run_pass("enqueue").await;
                }
                Some(()) = online_edges.next() => {
                    self.run_pass("reconnect").await;
                }
                _ = ticker.tick() => {
                    self.run_pass("timer").await;
                }
            }
        }
    }

    async fn run_pass(&self, trigger: &'static str) {
        let outcome = self.engine.process().await;
        tracing::trace!(trigger, outcome = ?outcome, "Drain trigger handled");
    }
}
