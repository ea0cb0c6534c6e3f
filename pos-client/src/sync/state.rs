//! Drain state machine
//!
//! ```text
//!            begin(online, pending > 0)
//!   Idle ───────────────────────────────▶ Draining
//!    ▲                                       │
//!    └────────────── finish() ───────────────┘
//! ```

use std::fmt;

/// Whether a drain pass is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Draining,
}

/// Why a drain trigger did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    EmptyQueue,
    AlreadyDraining,
}

impl SyncState {
    /// `Idle -> Draining` when online, with pending orders, and not already
    /// draining. Any other combination is a no-op with its reason.
    pub fn begin(self, online: bool, pending: usize) -> Result<SyncState, SkipReason> {
        if self == SyncState::Draining {
            return Err(SkipReason::AlreadyDraining);
        }
        if !online {
            return Err(SkipReason::Offline);
        }
        if pending == 0 {
            return Err(SkipReason::EmptyQueue);
        }
        Ok(SyncState::Draining)
    }

    /// End of a pass, however it ended
    pub fn finish(self) -> SyncState {
        SyncState::Idle
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Draining => write!(f, "draining"),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Offline => write!(f, "offline"),
            SkipReason::EmptyQueue => write!(f, "queue empty"),
            SkipReason::AlreadyDraining => write!(f, "already draining"),
        }
    }
}
