//! Backend reachability
//!
//! Holds the current online/offline state and lets the scheduler wait for
//! the offline → online edge. The state is driven either by the host
//! application (`set_online`) or by [`spawn_probe`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shared reachability flag with change notification
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update reachability.
    ///
    /// Returns `true` only for an offline → online transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                tracing::info!("Backend reachable");
            } else {
                tracing::warn!("Backend unreachable, orders will be queued");
            }
        }
        changed && online
    }

    /// Edge stream that fires on every offline → online transition seen
    /// after this call
    pub fn online_edges(&self) -> OnlineEdges {
        OnlineEdges {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiver side of [`Connectivity::online_edges`]
#[derive(Debug)]
pub struct OnlineEdges {
    rx: watch::Receiver<bool>,
}

impl OnlineEdges {
    /// Wait for the next transition to online.
    ///
    /// Returns `None` once every [`Connectivity`] handle has been dropped.
    pub async fn next(&mut self) -> Option<()> {
        loop {
            self.rx.changed().await.ok()?;
            if *self.rx.borrow_and_update() {
                return Some(());
            }
        }
    }
}

/// Something that can tell whether the backend answers
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Poll `probe` every `interval` and feed the result into `connectivity`
/// until `shutdown` is cancelled.
pub fn spawn_probe(
    probe: Arc<dyn ReachabilityProbe>,
    connectivity: Connectivity,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reachable = probe.is_reachable().await;
                    connectivity.set_online(reachable);
                }
                _ = shutdown.cancelled() => {
                    tracing::debug!("Reachability probe stopped");
                    return;
                }
            }
        }
    })
}
