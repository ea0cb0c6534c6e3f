// pos-client/tests/offline_queue.rs
// Offline queue + sync engine behaviour against a scripted backend

use async_trait::async_trait;
use parking_lot::Mutex;
use pos_client::{
    ClientError, ClientResult, Connectivity, HaltReason, MemoryStorage, OrderPayload,
    OrderRequest, OrderSubmitter, PassOutcome, PosError, PosRuntime, QueueStore, RedbStorage,
    ServiceType, SkipReason, SlotStorage, StorageError, SubmitOutcome, SyncEngine, SyncState,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Scripted backend
// ============================================================================

#[derive(Clone)]
enum Reply {
    Reject(&'static str),
    Fail,
}

/// Accepts everything unless scripted otherwise; can hold submissions until
/// the test releases them
#[derive(Default)]
struct FakeBackend {
    received: Mutex<Vec<String>>,
    script: Mutex<HashMap<String, Reply>>,
    hold: Option<Arc<Semaphore>>,
    entered: Notify,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every submission waits for a permit from `release`
    fn holding() -> Arc<Self> {
        Arc::new(Self {
            hold: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        })
    }

    fn release(&self, permits: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(permits);
        }
    }

    fn script(&self, reference: &str, reply: Reply) {
        self.script.lock().insert(reference.to_string(), reply);
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl OrderSubmitter for FakeBackend {
    async fn submit(&self, payload: &OrderPayload) -> ClientResult<SubmitOutcome> {
        let reference = payload.as_map()["ref"].as_str().unwrap().to_string();
        self.received.lock().push(reference.clone());
        self.entered.notify_one();

        let hold = self.hold.clone();
        if let Some(hold) = hold {
            hold.acquire().await.unwrap().forget();
        }

        let reply = self.script.lock().get(&reference).cloned();
        match reply {
            None => Ok(SubmitOutcome::Accepted),
            Some(Reply::Reject(message)) => Ok(SubmitOutcome::Rejected {
                message: message.to_string(),
            }),
            Some(Reply::Fail) => Err(ClientError::Status {
                status: 502,
                body: "bad gateway".into(),
            }),
        }
    }
}

/// Storage that refuses every write
struct FullDisk;

impl SlotStorage for FullDisk {
    fn read(&self, _slot: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    fn write(&self, _slot: &str, _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk full".into()))
    }

    fn remove(&self, _slot: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Memory storage that starts refusing writes after `limit` successful ones
struct WearingDisk {
    inner: MemoryStorage,
    writes: AtomicUsize,
    limit: usize,
}

impl WearingDisk {
    fn new(limit: usize) -> Self {
        Self {
            inner: MemoryStorage::new(),
            writes: AtomicUsize::new(0),
            limit,
        }
    }
}

impl SlotStorage for WearingDisk {
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.read(slot)
    }

    fn write(&self, slot: &str, value: &[u8]) -> Result<(), StorageError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.limit {
            return Err(StorageError::Unavailable("read-only filesystem".into()));
        }
        self.inner.write(slot, value)
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        self.inner.remove(slot)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn order(reference: &str) -> OrderPayload {
    OrderPayload::action("registrar_pedido").with_field("ref", reference)
}

fn engine_with(backend: Arc<FakeBackend>, online: bool) -> Arc<SyncEngine> {
    let queue = Arc::new(QueueStore::open(Arc::new(MemoryStorage::new())));
    Arc::new(SyncEngine::new(queue, backend, Connectivity::new(online)))
}

fn enqueue_all(engine: &SyncEngine, refs: &[&str]) -> Vec<String> {
    refs.iter()
        .map(|r| engine.queue().enqueue(order(r)).unwrap().local_id)
        .collect()
}

fn queued_refs(engine: &SyncEngine) -> Vec<String> {
    engine
        .queue()
        .snapshot()
        .into_iter()
        .map(|e| e.payload.as_map()["ref"].as_str().unwrap().to_string())
        .collect()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_delivery_order_matches_enqueue_order() {
    let backend = FakeBackend::new();
    let engine = engine_with(backend.clone(), true);
    let refs: Vec<String> = (0..20).map(|i| format!("o{i}")).collect();
    let ref_strs: Vec<&str> = refs.iter().map(String::as_str).collect();
    enqueue_all(&engine, &ref_strs);

    assert_eq!(engine.process().await, PassOutcome::Drained { delivered: 20 });
    assert_eq!(backend.received(), refs);
    assert!(engine.queue().is_empty());
}

#[tokio::test]
async fn test_removing_unknown_id_is_noop() {
    let engine = engine_with(FakeBackend::new(), true);
    enqueue_all(&engine, &["a", "b"]);

    assert!(!engine.queue().remove("12345").unwrap());
    assert_eq!(queued_refs(&engine), vec!["a", "b"]);
}

#[tokio::test]
async fn test_only_one_pass_runs_at_a_time() {
    let backend = FakeBackend::holding();
    let engine = engine_with(backend.clone(), true);
    enqueue_all(&engine, &["a", "b", "c"]);

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.process().await }
    });
    backend.entered.notified().await;
    assert_eq!(engine.status().state, SyncState::Draining);

    for _ in 0..5 {
        assert_eq!(
            engine.process().await,
            PassOutcome::Skipped(SkipReason::AlreadyDraining)
        );
    }

    backend.release(3);
    assert_eq!(first.await.unwrap(), PassOutcome::Drained { delivered: 3 });
    assert_eq!(backend.received(), vec!["a", "b", "c"]);
    assert_eq!(engine.status().state, SyncState::Idle);
}

#[tokio::test]
async fn test_transport_failure_keeps_failed_and_later_orders() {
    let backend = FakeBackend::new();
    backend.script("b", Reply::Fail);
    let engine = engine_with(backend.clone(), true);
    let ids = enqueue_all(&engine, &["a", "b", "c"]);

    let outcome = engine.process().await;
    assert!(matches!(
        outcome,
        PassOutcome::Halted { delivered: 1, ref local_id, reason: HaltReason::Transport(_) }
            if *local_id == ids[1]
    ));
    assert_eq!(backend.received(), vec!["a", "b"]);
    assert_eq!(queued_refs(&engine), vec!["b", "c"]);
}

#[tokio::test]
async fn test_business_rejection_halts_like_transport_failure() {
    // O1 accepted, O2 rejected ("mesa llena"), O3 never attempted
    let backend = FakeBackend::new();
    backend.script("O2", Reply::Reject("mesa llena"));
    let engine = engine_with(backend.clone(), true);
    enqueue_all(&engine, &["O1", "O2", "O3"]);

    let outcome = engine.process().await;
    assert!(matches!(
        outcome,
        PassOutcome::Halted { delivered: 1, reason: HaltReason::Rejected(ref m), .. }
            if m == "mesa llena"
    ));
    assert_eq!(backend.received(), vec!["O1", "O2"]);
    assert_eq!(queued_refs(&engine), vec!["O2", "O3"]);

    // Every later pass retries from the front and stops at the same place
    engine.process().await;
    assert_eq!(backend.received(), vec!["O1", "O2", "O2"]);
    assert_eq!(queued_refs(&engine), vec!["O2", "O3"]);
}

#[tokio::test]
async fn test_gate_blocks_offline_and_empty() {
    let backend = FakeBackend::new();
    let engine = engine_with(backend.clone(), false);

    // Offline is reported before an empty queue
    assert_eq!(
        engine.process().await,
        PassOutcome::Skipped(SkipReason::Offline)
    );

    enqueue_all(&engine, &["a"]);
    assert_eq!(
        engine.process().await,
        PassOutcome::Skipped(SkipReason::Offline)
    );
    assert!(backend.received().is_empty());
    assert_eq!(engine.queue().len(), 1);

    engine.connectivity().set_online(true);
    assert_eq!(engine.process().await, PassOutcome::Drained { delivered: 1 });
    assert_eq!(
        engine.process().await,
        PassOutcome::Skipped(SkipReason::EmptyQueue)
    );
}

#[tokio::test]
async fn test_order_enqueued_during_pass_waits_for_next_pass() {
    let backend = FakeBackend::holding();
    let engine = engine_with(backend.clone(), true);
    enqueue_all(&engine, &["a"]);

    let pass = tokio::spawn({
        let engine = engine.clone();
        async move { engine.process().await }
    });
    backend.entered.notified().await;

    enqueue_all(&engine, &["late"]);
    backend.release(10);

    assert_eq!(pass.await.unwrap(), PassOutcome::Drained { delivered: 1 });
    assert_eq!(queued_refs(&engine), vec!["late"]);

    assert_eq!(engine.process().await, PassOutcome::Drained { delivered: 1 });
    assert_eq!(backend.received(), vec!["a", "late"]);
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.redb");

    let before = {
        let storage = Arc::new(RedbStorage::open(&path).unwrap());
        let queue = QueueStore::open(storage);
        queue.enqueue(order("first")).unwrap();
        queue.enqueue(order("second")).unwrap();
        queue.enqueue(order("third")).unwrap();
        queue.snapshot()
    };

    let storage = Arc::new(RedbStorage::open(&path).unwrap());
    let queue = QueueStore::open(storage);
    assert_eq!(queue.snapshot(), before);

    // New ids keep increasing after a restart
    let next = queue.enqueue(order("fourth")).unwrap();
    let last_before: i64 = before[2].local_id.parse().unwrap();
    assert!(next.local_id.parse::<i64>().unwrap() > last_before);
}

#[tokio::test]
async fn test_failed_durable_write_rejects_order() {
    let backend = FakeBackend::new();
    let runtime = PosRuntime::start(
        Arc::new(FullDisk),
        backend.clone(),
        Connectivity::new(true),
        Duration::from_secs(3600),
    );

    let request =
        OrderRequest::new(ServiceType::DineIn).with_line("Ajiaco", 1, Decimal::new(16000, 0));
    let err = runtime.service().register_order(request).unwrap_err();
    assert!(matches!(err, PosError::Queue(_)));
    assert_eq!(runtime.service().pending_orders(), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(backend.received().is_empty());
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_invalid_order_never_reaches_queue() {
    let runtime = PosRuntime::start(
        Arc::new(MemoryStorage::new()),
        FakeBackend::new(),
        Connectivity::new(false),
        Duration::from_secs(3600),
    );

    let request = OrderRequest::new(ServiceType::Delivery {
        destination: "".into(),
        recipient: "Ana".into(),
    })
    .with_line("Ajiaco", 1, Decimal::new(16000, 0));

    assert!(matches!(
        runtime.service().register_order(request),
        Err(PosError::Validation(_))
    ));
    assert_eq!(runtime.service().pending_orders(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_offline_order_sent_once_connectivity_returns() {
    let backend = FakeBackend::new();
    let runtime = PosRuntime::start(
        Arc::new(MemoryStorage::new()),
        backend.clone(),
        Connectivity::new(false),
        Duration::from_secs(3600),
    );

    let request =
        OrderRequest::new(ServiceType::Takeout).with_line("Empanada", 3, Decimal::new(2500, 0));
    runtime.service().register_order(request).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.received.lock().len(), 0);
    assert_eq!(runtime.service().pending_orders(), 1);

    runtime.connectivity().set_online(true);
    wait_until(|| runtime.service().pending_orders() == 0).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.received.lock().len(), 1);
    assert_eq!(runtime.failed_tasks(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_enqueue_triggers_delivery_when_online() {
    let backend = FakeBackend::new();
    let runtime = PosRuntime::start(
        Arc::new(MemoryStorage::new()),
        backend.clone(),
        Connectivity::new(true),
        Duration::from_secs(3600),
    );
    let mut status = runtime.service().watch_sync();

    for n in 1..=3 {
        let request = OrderRequest::new(ServiceType::DineIn)
            .with_line("Sancocho", n, Decimal::new(15000, 0));
        runtime.service().register_order(request).unwrap();
    }

    wait_until(|| backend.received.lock().len() == 3).await;
    wait_until(|| runtime.service().pending_orders() == 0).await;
    assert!(status.has_changed().unwrap());
    assert_eq!(status.borrow_and_update().state, SyncState::Idle);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_timer_retries_after_failure() {
    let backend = FakeBackend::new();
    backend.script("stuck", Reply::Fail);

    let storage = Arc::new(MemoryStorage::new());
    {
        let queue = QueueStore::open(storage.clone());
        queue.enqueue(order("stuck")).unwrap();
    }

    let runtime = PosRuntime::start(
        storage,
        backend.clone(),
        Connectivity::new(true),
        Duration::from_millis(20),
    );

    // Startup pass plus at least two timer passes, each stopping at the same order
    wait_until(|| backend.received.lock().len() >= 3).await;
    assert_eq!(runtime.service().pending_orders(), 1);
    assert!(backend.received().iter().all(|r| r == "stuck"));
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_unpersisted_removal_halts_and_keeps_orders() {
    // Two enqueues succeed, the removal after the first delivery does not
    let storage = Arc::new(WearingDisk::new(2));
    let queue = Arc::new(QueueStore::open(storage.clone()));
    let backend = FakeBackend::new();
    let engine = SyncEngine::new(queue.clone(), backend.clone(), Connectivity::new(true));

    let first = queue.enqueue(order("a")).unwrap();
    queue.enqueue(order("b")).unwrap();

    let outcome = engine.process().await;
    assert!(matches!(
        outcome,
        PassOutcome::Halted { delivered: 0, ref local_id, reason: HaltReason::Storage(_) }
            if *local_id == first.local_id
    ));
    assert_eq!(backend.received(), vec!["a"]);
    assert_eq!(queue.len(), 2);
    assert_eq!(engine.status().state, SyncState::Idle);

    // Storage still holds both entries, matching memory
    let reopened = QueueStore::open(storage);
    assert_eq!(reopened.snapshot(), queue.snapshot());
}

#[tokio::test]
async fn test_cancelled_pass_publishes_idle() {
    let backend = FakeBackend::holding();
    let engine = engine_with(backend.clone(), true);
    enqueue_all(&engine, &["a"]);
    let status = engine.subscribe();

    let pass = tokio::spawn({
        let engine = engine.clone();
        async move { engine.process().await }
    });
    backend.entered.notified().await;
    assert_eq!(status.borrow().state, SyncState::Draining);

    pass.abort();
    assert!(pass.await.unwrap_err().is_cancelled());

    assert_eq!(engine.status().state, SyncState::Idle);
    assert_eq!(status.borrow().state, SyncState::Idle);
    assert_eq!(queued_refs(&engine), vec!["a"]);
}

#[tokio::test]
async fn test_published_status_ends_with_last_pass() {
    let backend = FakeBackend::new();
    let engine = engine_with(backend.clone(), true);
    let status = engine.subscribe();

    for r in ["a", "b", "c"] {
        enqueue_all(&engine, &[r]);
        engine.process().await;
        let seen = status.borrow().clone();
        assert_eq!(seen.state, SyncState::Idle);
        assert_eq!(seen.pending, 0);
        assert_eq!(seen.last_outcome, Some(PassOutcome::Drained { delivered: 1 }));
    }
}

#[tokio::test]
async fn test_shutdown_lets_running_pass_finish() {
    let backend = FakeBackend::holding();
    let runtime = PosRuntime::start(
        Arc::new(MemoryStorage::new()),
        backend.clone(),
        Connectivity::new(true),
        Duration::from_secs(3600),
    );
    let request =
        OrderRequest::new(ServiceType::DineIn).with_line("Ajiaco", 1, Decimal::new(16000, 0));
    runtime.service().register_order(request).unwrap();
    backend.entered.notified().await;

    let service = runtime.service().clone();
    let shutdown = tokio::spawn(runtime.shutdown());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!shutdown.is_finished());
    assert_eq!(service.pending_orders(), 1);

    backend.release(1);
    tokio::time::timeout(Duration::from_secs(2), shutdown)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(service.pending_orders(), 0);
}
