//! Remote submission seam
//!
//! The sync engine only needs one operation from the backend: submit a
//! payload and learn whether it was accepted. [`HttpClient`](crate::HttpClient)
//! is the production implementation; tests script their own.

use crate::ClientResult;
use async_trait::async_trait;
use shared::OrderPayload;

/// Result of a delivery the backend actually processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Delivery confirmed
    Accepted,
    /// Backend processed the request but refused it
    Rejected { message: String },
}

/// Delivers one payload to the backend.
///
/// `Err` is a transport failure (network, timeout, HTTP status, bad body);
/// `Ok(Rejected)` is a business rejection.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn submit(&self, payload: &OrderPayload) -> ClientResult<SubmitOutcome>;
}
