//! Device token persistence
//!
//! The token is an opaque value an operator types once per device. It is
//! kept in its own storage slot so it survives restarts.

use crate::storage::{SlotStorage, StorageError};
use std::sync::Arc;
use thiserror::Error;

/// Storage slot holding the device token
pub const TOKEN_SLOT: &str = "device_token";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Device token must not be blank")]
    Blank,

    #[error("Failed to persist device token: {0}")]
    Storage(#[from] StorageError),
}

/// Reads and writes the device token slot
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SlotStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self { storage }
    }

    /// Stored token, if any. Unreadable values are treated as absent.
    pub fn load(&self) -> Option<String> {
        match self.storage.read(TOKEN_SLOT) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(token) if !token.trim().is_empty() => Some(token),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored device token is not valid UTF-8");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read device token");
                None
            }
        }
    }

    /// Persist a new token (trimmed) and return it
    pub fn set(&self, token: &str) -> Result<String, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Blank);
        }
        self.storage.write(TOKEN_SLOT, token.as_bytes())?;
        tracing::info!("Device token stored");
        Ok(token.to_string())
    }

    /// Forget the stored token
    pub fn clear(&self) -> Result<(), TokenError> {
        self.storage.remove(TOKEN_SLOT)?;
        tracing::info!("Device token removed");
        Ok(())
    }
}
