//! Stopwatch state machine and elapsed-time accounting

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current mode of the stopwatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Stopped,
    Running,
    Paused,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Stopped => "stopped",
            Phase::Running => "running",
            Phase::Paused => "paused",
        }
    }

    /// Actions a menu would offer from this phase
    pub fn available_actions(&self) -> &'static [Action] {
        match self {
            Phase::Stopped => &[Action::Start],
            Phase::Running => &[Action::Pause, Action::Reset],
            Phase::Paused => &[Action::Resume, Action::Reset],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Pause,
    Resume,
    Reset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Reset => "reset",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seconds between `since` and `now`, clamped at zero when the clock went backwards
pub fn interval_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since)
        .to_std()
        .map(|interval| interval.as_secs_f64())
        .unwrap_or(0.0)
}

/// Total elapsed seconds: banked time plus the open running interval, if any
pub fn elapsed_seconds(
    accumulated_seconds: f64,
    running_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    match running_since {
        Some(since) => accumulated_seconds + interval_seconds(since, now),
        None => accumulated_seconds,
    }
}

/// The persisted stopwatch state.
///
/// `running_since` only exists in the `Running` variant, and `Stopped` carries
/// no banked time: the only ways into it are the initial state and `reset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopwatchState {
    Stopped,
    Paused {
        accumulated_seconds: f64,
    },
    Running {
        accumulated_seconds: f64,
        running_since: DateTime<Utc>,
    },
}

impl StopwatchState {
    /// The canonical reset state
    pub fn zero() -> Self {
        StopwatchState::Stopped
    }

    pub fn phase(&self) -> Phase {
        match self {
            StopwatchState::Stopped => Phase::Stopped,
            StopwatchState::Paused { .. } => Phase::Paused,
            StopwatchState::Running { .. } => Phase::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, StopwatchState::Running { .. })
    }

    pub fn accumulated_seconds(&self) -> f64 {
        match *self {
            StopwatchState::Stopped => 0.0,
            StopwatchState::Paused { accumulated_seconds }
            | StopwatchState::Running { accumulated_seconds, .. } => accumulated_seconds,
        }
    }

    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        match *self {
            StopwatchState::Running { running_since, .. } => Some(running_since),
            _ => None,
        }
    }

    /// Elapsed seconds as of `now`. Never mutates.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        elapsed_seconds(self.accumulated_seconds(), self.running_since(), now)
    }

    /// Apply `action` at `now`. Returns false, leaving the state untouched,
    /// when the action is not valid from the current phase.
    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> bool {
        match action {
            Action::Start => self.start(now),
            Action::Pause => self.pause(now),
            Action::Resume => self.resume(now),
            Action::Reset => self.reset(),
        }
    }

    /// Begin a fresh session from `Stopped`
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self {
            StopwatchState::Stopped => {
                *self = StopwatchState::Running {
                    accumulated_seconds: 0.0,
                    running_since: now,
                };
                true
            }
            _ => false,
        }
    }

    /// Bank the open interval and stop counting
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        match *self {
            StopwatchState::Running {
                accumulated_seconds,
                running_since,
            } => {
                *self = StopwatchState::Paused {
                    accumulated_seconds: accumulated_seconds + interval_seconds(running_since, now),
                };
                true
            }
            _ => false,
        }
    }

    /// Continue counting on top of the banked time
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        match *self {
            StopwatchState::Paused { accumulated_seconds } => {
                *self = StopwatchState::Running {
                    accumulated_seconds,
                    running_since: now,
                };
                true
            }
            _ => false,
        }
    }

    /// Return to the zero state. Valid from any phase.
    pub fn reset(&mut self) -> bool {
        *self = StopwatchState::zero();
        true
    }
}

impl Default for StopwatchState {
    fn default() -> Self {
        Self::zero()
    }
}
