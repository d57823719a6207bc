//! State management module
//!
//! This module contains the stopwatch state machine and its owner.

pub mod app_state;
pub mod snapshot;
pub mod stopwatch;

// Re-export main types
pub use app_state::{AppState, EngineOptions, TransitionOutcome};
pub use snapshot::StopwatchSnapshot;
pub use stopwatch::{elapsed_seconds, Action, Phase, StopwatchState};
