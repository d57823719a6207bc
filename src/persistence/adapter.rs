//! Save and restore of the stopwatch state through a key-value store

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::store::KeyValueStore;
use crate::{
    error::PersistenceError,
    state::{Phase, StopwatchState},
};

pub const PHASE_KEY: &str = "phase";
pub const ACCUMULATED_KEY: &str = "accumulatedSeconds";
pub const RUNNING_SINCE_KEY: &str = "runningSince";

/// Persists the stopwatch state as three keys in a [`KeyValueStore`]
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write phase, accumulated time and running-since in one store write
    pub fn save(&self, state: &StopwatchState) -> Result<(), PersistenceError> {
        let running_since = match state.running_since() {
            Some(since) => serde_json::to_value(since)?,
            None => Value::Null,
        };

        self.store.set_all(vec![
            (PHASE_KEY.to_string(), Value::from(state.phase().as_str())),
            (ACCUMULATED_KEY.to_string(), Value::from(state.accumulated_seconds())),
            (RUNNING_SINCE_KEY.to_string(), running_since),
        ])?;

        debug!("Saved stopwatch state: {:?}", state);
        Ok(())
    }

    /// Load the saved state. Anything missing or malformed yields the zero state.
    pub fn restore(&self) -> StopwatchState {
        match self.try_restore() {
            Ok(Some(state)) => {
                info!(
                    "Restored stopwatch: phase={}, accumulated={:.1}s",
                    state.phase(),
                    state.accumulated_seconds()
                );
                state
            }
            Ok(None) => {
                info!("No saved stopwatch state, starting stopped");
                StopwatchState::zero()
            }
            Err(e) => {
                warn!("Discarding saved stopwatch state: {}", e);
                StopwatchState::zero()
            }
        }
    }

    fn try_restore(&self) -> Result<Option<StopwatchState>, PersistenceError> {
        let Some(phase) = self.store.get(PHASE_KEY)? else {
            return Ok(None);
        };
        let phase: Phase = serde_json::from_value(phase)
            .map_err(|e| PersistenceError::Corrupt(format!("unknown phase: {}", e)))?;

        if phase == Phase::Stopped {
            return Ok(Some(StopwatchState::zero()));
        }

        let accumulated_seconds = self
            .store
            .get(ACCUMULATED_KEY)?
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .ok_or_else(|| {
                PersistenceError::Corrupt(format!("missing or invalid {}", ACCUMULATED_KEY))
            })?;

        if phase == Phase::Paused {
            return Ok(Some(StopwatchState::Paused { accumulated_seconds }));
        }

        let running_since = match self.store.get(RUNNING_SINCE_KEY)? {
            Some(value) if !value.is_null() => serde_json::from_value::<DateTime<Utc>>(value)
                .map_err(|e| {
                    PersistenceError::Corrupt(format!("invalid {}: {}", RUNNING_SINCE_KEY, e))
                })?,
            _ => {
                return Err(PersistenceError::Corrupt(format!(
                    "running without {}",
                    RUNNING_SINCE_KEY
                )))
            }
        };

        Ok(Some(StopwatchState::Running {
            accumulated_seconds,
            running_since,
        }))
    }
}
