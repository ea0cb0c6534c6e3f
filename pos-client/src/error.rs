//! Client error types

use thiserror::Error;

/// Transport-level failure talking to the backend.
///
/// A business rejection of a queued order is not an error: it comes back as
/// [`SubmitOutcome::Rejected`](crate::SubmitOutcome::Rejected). The
/// `Rejected` variant here is only used by the direct (non-queued) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success HTTP status
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No device token configured
    #[error("Device token not configured")]
    Unauthorized,

    /// Backend processed the request but reported a failure
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
