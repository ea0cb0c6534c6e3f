//! Process wiring
//!
//! Builds the queue, engine and UI service around one storage backend and
//! one submitter, then starts the background tasks that drive draining.

use crate::queue::QueueStore;
use crate::service::PosService;
use crate::storage::SlotStorage;
use crate::submitter::OrderSubmitter;
use crate::sync::{Connectivity, ReachabilityProbe, SyncEngine, SyncScheduler, spawn_probe};
use crate::tasks::{BackgroundTasks, TaskKind};
use std::sync::Arc;
use std::time::Duration;

/// A running POS sync client
pub struct PosRuntime {
    service: PosService,
    engine: Arc<SyncEngine>,
    tasks: BackgroundTasks,
}

impl PosRuntime {
    /// Restore the queue from `storage` and start the sync scheduler.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        storage: Arc<dyn SlotStorage>,
        submitter: Arc<dyn OrderSubmitter>,
        connectivity: Connectivity,
        sync_interval: Duration,
    ) -> Self {
        let queue = Arc::new(QueueStore::open(storage));
        let engine = Arc::new(SyncEngine::new(queue, submitter, connectivity));
        let service = PosService::new(engine.clone());

        let mut tasks = BackgroundTasks::new();
        let scheduler = SyncScheduler::new(engine.clone(), sync_interval, tasks.shutdown_token());
        tasks.spawn("sync_scheduler", TaskKind::Worker, scheduler.run());

        Self {
            service,
            engine,
            tasks,
        }
    }

    /// Drive connectivity from a reachability probe
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>, interval: Duration) -> Self {
        let handle = spawn_probe(
            probe,
            self.engine.connectivity().clone(),
            interval,
            self.tasks.shutdown_token(),
        );
        self.tasks.register("reachability_probe", TaskKind::Periodic, handle);
        self
    }

    pub fn service(&self) -> &PosService {
        &self.service
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn connectivity(&self) -> &Connectivity {
        self.engine.connectivity()
    }

    /// Number of background tasks that have stopped while they should be
    /// running
    pub fn failed_tasks(&self) -> usize {
        self.tasks.check_health()
    }

    /// Stop the scheduler and probe.
    ///
    /// The scheduler only sees the cancellation between passes, so a pass in
    /// progress runs to its end first.
    pub async fn shutdown(self) {
        self.tasks.shutdown().await;
    }
}
