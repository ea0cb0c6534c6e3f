//! POS Client - offline order queue for the order-management backend
//!
//! Orders are written to a durable queue first and delivered in the
//! background, strictly in order, whenever the backend is reachable.
//!
//! - [`QueueStore`]: write-through queue over a [`SlotStorage`] backend
//! - [`SyncEngine`]: one-at-a-time, stop-on-first-failure drain passes
//! - [`SyncScheduler`]: enqueue / reconnect / timer triggers
//! - [`HttpClient`]: the backend transport
//! - [`PosRuntime`]: wires it all together

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod queue;
pub mod runtime;
pub mod service;
pub mod storage;
pub mod submitter;
pub mod sync;
pub mod tasks;
pub mod token;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use queue::{QueueError, QueueStore, QueuedOrder};
pub use runtime::PosRuntime;
pub use service::{PosError, PosService};
pub use storage::{MemoryStorage, RedbStorage, SlotStorage, StorageError};
pub use submitter::{OrderSubmitter, SubmitOutcome};
pub use sync::{
    Connectivity, HaltReason, PassOutcome, SkipReason, SyncEngine, SyncScheduler, SyncState,
    SyncStatus,
};
pub use token::{TokenError, TokenStore};

// Re-export shared types for convenience
pub use shared::{OrderLine, OrderPayload, OrderRequest, OrderValidationError, ServiceType};
