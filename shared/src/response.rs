//! Backend response envelope
//!
//! The order-management backend answers every action with a flat JSON
//! object:
//!
//! ```json
//! { "status": "success", "message": "...", ...action-specific fields }
//! ```
//!
//! Any `status` other than `"success"` is a business rejection carrying a
//! human-readable `message`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status value reported for accepted requests
pub const STATUS_SUCCESS: &str = "success";

/// Message used when a rejection arrives without one
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Flat response envelope; `T` captures the action-specific fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResponse<T = Map<String, Value>> {
    /// `"success"` or an error marker
    pub status: String,
    /// Human-readable message (present on rejections)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Action-specific fields
    #[serde(flatten)]
    pub data: T,
}

impl<T> BackendResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Rejection message, falling back to a generic one
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp: BackendResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(resp.is_success());
        assert!(resp.data.is_empty());
    }

    #[test]
    fn test_rejection_keeps_message() {
        let resp: BackendResponse =
            serde_json::from_str(r#"{"status":"error","message":"mesa llena"}"#).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.failure_message(), "mesa llena");
    }

    #[test]
    fn test_rejection_without_message() {
        let resp: BackendResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(resp.failure_message(), UNKNOWN_ERROR_MESSAGE);
    }
}
