//! Shared types for the POS front end
//!
//! Wire types exchanged with the order-management backend: the typed order
//! request built by the UI, the opaque submission payload carried by the
//! offline queue, and the backend response envelope.

pub mod models;
pub mod order;
pub mod response;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{DailyData, Dish};
pub use order::{OrderLine, OrderPayload, OrderRequest, OrderValidationError, ServiceType};
pub use response::BackendResponse;
