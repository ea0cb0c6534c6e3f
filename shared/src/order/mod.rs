//! Order submission types
//!
//! - [`OrderRequest`]: typed order composed on the POS screen, validated at
//!   the boundary
//! - [`OrderPayload`]: opaque backend-bound body carried by the offline queue

pub mod payload;
pub mod types;

// Re-exports
pub use payload::{
    ACTION_FETCH_DAILY_DATA, ACTION_REGISTER_ORDER, ACTION_SAVE_DAILY_MENU, OrderPayload,
};
pub use types::{OrderLine, OrderRequest, OrderValidationError, ServiceType};
