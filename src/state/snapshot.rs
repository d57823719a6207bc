//! Point-in-time view of the stopwatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Phase, StopwatchState};
use crate::display::format_elapsed;

/// Stopwatch fields plus the derived elapsed time, all taken at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopwatchSnapshot {
    pub phase: Phase,
    pub accumulated_seconds: f64,
    pub running_since: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
    pub display: String,
}

impl StopwatchSnapshot {
    pub fn capture(state: &StopwatchState, now: DateTime<Utc>) -> Self {
        let elapsed_seconds = state.elapsed_seconds(now);
        Self {
            phase: state.phase(),
            accumulated_seconds: state.accumulated_seconds(),
            running_since: state.running_since(),
            elapsed_seconds,
            display: format_elapsed(elapsed_seconds),
        }
    }
}
