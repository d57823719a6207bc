//! Error types

use thiserror::Error;

use crate::state::{Action, Phase};

/// Errors raised by the stopwatch engine
#[derive(Debug, Error)]
pub enum StopwatchError {
    /// Only returned when the engine runs in strict mode
    #[error("cannot {action} while {phase}")]
    InvalidTransition { action: Action, phase: Phase },

    #[error("failed to lock stopwatch state: {0}")]
    LockPoisoned(String),
}

/// Errors raised by key-value stores
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("state store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state store encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state store is corrupt: {0}")]
    Corrupt(String),
}

/// Errors raised while toggling launch at login
#[derive(Debug, Error)]
pub enum AutostartError {
    #[error("autostart entry I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no user configuration directory available")]
    NoConfigDir,
}
