//! Main application state: the single owner of the stopwatch

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

use super::{Action, StopwatchSnapshot, StopwatchState};
use crate::{
    clock::Clock,
    display::format_elapsed,
    error::StopwatchError,
    persistence::{KeyValueStore, Persistence},
    services::Autostart,
    tasks::Ticker,
};

/// Engine behaviour switches
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Interval between display refreshes while running
    pub tick_period: Duration,
    /// Report invalid transitions as errors instead of ignoring them
    pub strict: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            strict: false,
        }
    }
}

/// Result of a transition request
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub action: Action,
    /// False when the action was not valid from the current phase
    pub applied: bool,
    pub snapshot: StopwatchSnapshot,
}

/// Everything guarded by the state lock
#[derive(Debug)]
struct Inner {
    stopwatch: StopwatchState,
    /// Last save failed and should be retried
    dirty: bool,
    last_action: Option<Action>,
    last_action_time: Option<DateTime<Utc>>,
}

/// Owns the stopwatch state and serializes every read and write of it.
///
/// Transitions, ticks and shutdown all take the same lock, and the save and
/// display publication happen while it is held.
pub struct AppState {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    persistence: Persistence,
    ticker: Ticker,
    strict: bool,
    autostart: Option<Autostart>,
    /// Server metadata
    pub start_time: Instant,
    /// Channel carrying the formatted display string
    display_tx: watch::Sender<String>,
    /// Keep the receiver alive to prevent channel closure
    _display_rx: watch::Receiver<String>,
    /// Mirrors `Inner::dirty` for the save retry task
    dirty_tx: watch::Sender<bool>,
    /// Set once the final save has happened
    shutdown_tx: watch::Sender<bool>,
    quit: Notify,
}

impl AppState {
    /// Restore the stopwatch from `store` and start ticking if it was running
    pub fn new(clock: Arc<dyn Clock>, store: Box<dyn KeyValueStore>, options: EngineOptions) -> Self {
        let persistence = Persistence::new(store);
        let stopwatch = persistence.restore();
        let now = clock.now();

        let (display_tx, display_rx) =
            watch::channel(format_elapsed(stopwatch.elapsed_seconds(now)));

        let (dirty_tx, _) = watch::channel(false);
        let (shutdown_tx, _) = watch::channel(false);

        let ticker = Ticker::new(options.tick_period);
        if stopwatch.is_running() {
            info!("Stopwatch was running before restart, resuming live display");
            ticker.start();
        }

        Self {
            inner: Mutex::new(Inner {
                stopwatch,
                dirty: false,
                last_action: None,
                last_action_time: None,
            }),
            clock,
            persistence,
            ticker,
            strict: options.strict,
            autostart: None,
            start_time: Instant::now(),
            display_tx,
            _display_rx: display_rx,
            dirty_tx,
            shutdown_tx,
            quit: Notify::new(),
        }
    }

    /// Attach the launch-at-login manager
    pub fn with_autostart(mut self, autostart: Autostart) -> Self {
        self.autostart = Some(autostart);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StopwatchError> {
        self.inner
            .lock()
            .map_err(|e| StopwatchError::LockPoisoned(e.to_string()))
    }

    /// Begin a fresh session from `Stopped`
    pub fn start(&self) -> Result<TransitionOutcome, StopwatchError> {
        self.apply(Action::Start)
    }

    /// Bank the running interval
    pub fn pause(&self) -> Result<TransitionOutcome, StopwatchError> {
        self.apply(Action::Pause)
    }

    /// Continue a paused session on top of the banked time
    pub fn resume(&self) -> Result<TransitionOutcome, StopwatchError> {
        self.apply(Action::Resume)
    }

    /// Back to the zero state, from any phase
    pub fn reset(&self) -> Result<TransitionOutcome, StopwatchError> {
        self.apply(Action::Reset)
    }

    /// Run a transition: mutate, start or stop the ticker, refresh the display, save
    pub fn apply(&self, action: Action) -> Result<TransitionOutcome, StopwatchError> {
        let mut inner = self.lock()?;
        let now = self.clock.now();
        let from = inner.stopwatch.phase();

        if !inner.stopwatch.apply(action, now) {
            if self.strict {
                warn!("Rejected {} while {}", action, from);
                return Err(StopwatchError::InvalidTransition { action, phase: from });
            }
            debug!("Ignored {} while {}", action, from);
            return Ok(TransitionOutcome {
                action,
                applied: false,
                snapshot: StopwatchSnapshot::capture(&inner.stopwatch, now),
            });
        }

        inner.last_action = Some(action);
        inner.last_action_time = Some(now);

        if inner.stopwatch.is_running() {
            self.ticker.start();
        } else {
            self.ticker.stop();
        }

        let snapshot = StopwatchSnapshot::capture(&inner.stopwatch, now);
        info!("{}: {} -> {} at {}", action, from, snapshot.phase, snapshot.display);

        self.publish(snapshot.display.clone());
        self.persist(&mut inner);

        Ok(TransitionOutcome {
            action,
            applied: true,
            snapshot,
        })
    }

    /// Ticker callback: recompute and publish the display, retrying a failed save
    pub fn tick(&self) {
        let mut inner = match self.lock() {
            Ok(inner) => inner,
            Err(e) => {
                error!("Tick skipped: {}", e);
                return;
            }
        };

        let now = self.clock.now();
        self.publish(format_elapsed(inner.stopwatch.elapsed_seconds(now)));

        if inner.dirty {
            debug!("Retrying failed save");
            self.persist(&mut inner);
        }
    }

    /// Save again if the last save failed. Returns true once the state is saved.
    /// Works from any phase.
    pub fn retry_save(&self) -> bool {
        let mut inner = match self.lock() {
            Ok(inner) => inner,
            Err(e) => {
                error!("Save retry skipped: {}", e);
                return false;
            }
        };

        if inner.dirty {
            debug!("Retrying failed save");
            self.persist(&mut inner);
        }
        !inner.dirty
    }

    /// Stop ticking, save the final state and signal the display to finish
    pub fn shutdown(&self) {
        self.ticker.stop();

        match self.lock() {
            Ok(mut inner) => {
                self.persist(&mut inner);
                info!(
                    "Stopwatch saved on shutdown: phase={}",
                    inner.stopwatch.phase()
                );
            }
            Err(e) => error!("Could not save on shutdown: {}", e),
        }

        self.shutdown_tx.send_replace(true);
    }

    fn publish(&self, display: String) {
        if let Err(e) = self.display_tx.send(display) {
            warn!("Failed to publish display update: {}", e);
        }
    }

    /// Best effort: a failure is logged and retried until a save succeeds
    fn persist(&self, inner: &mut Inner) {
        let dirty = match self.persistence.save(&inner.stopwatch) {
            Ok(()) => false,
            Err(e) => {
                warn!("Failed to save stopwatch state: {}", e);
                true
            }
        };

        inner.dirty = dirty;
        self.dirty_tx.send_if_modified(|current| {
            if *current == dirty {
                false
            } else {
                *current = dirty;
                true
            }
        });
    }

    /// Current stopwatch state
    pub fn stopwatch(&self) -> Result<StopwatchState, StopwatchError> {
        Ok(self.lock()?.stopwatch)
    }

    /// Phase, accumulated and elapsed time as of now
    pub fn snapshot(&self) -> Result<StopwatchSnapshot, StopwatchError> {
        let inner = self.lock()?;
        Ok(StopwatchSnapshot::capture(&inner.stopwatch, self.clock.now()))
    }

    /// Elapsed seconds as of now
    pub fn elapsed_seconds(&self) -> Result<f64, StopwatchError> {
        let inner = self.lock()?;
        Ok(inner.stopwatch.elapsed_seconds(self.clock.now()))
    }

    /// Whether the last save failed
    pub fn has_unsaved_changes(&self) -> Result<bool, StopwatchError> {
        Ok(self.lock()?.dirty)
    }

    /// Handle controlling the display refresh
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Whether invalid transitions are reported as errors
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Launch-at-login manager, if the host supports one
    pub fn autostart(&self) -> Option<&Autostart> {
        self.autostart.as_ref()
    }

    /// Receiver flipping to true whenever a save has failed and is pending
    pub fn subscribe_dirty(&self) -> watch::Receiver<bool> {
        self.dirty_tx.subscribe()
    }

    /// Receiver flipping to true once [`AppState::shutdown`] has saved
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Receiver for the display string, updated on every tick and transition
    pub fn subscribe_display(&self) -> watch::Receiver<String> {
        self.display_tx.subscribe()
    }

    /// Most recently published display string
    pub fn current_display(&self) -> String {
        self.display_tx.borrow().clone()
    }

    /// Ask the process to shut down
    pub fn request_quit(&self) {
        info!("Quit requested");
        self.quit.notify_one();
    }

    /// Resolves once [`AppState::request_quit`] has been called
    pub async fn quit_requested(&self) {
        self.quit.notified().await;
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last applied action and when it happened
    pub fn get_last_action(&self) -> (Option<Action>, Option<DateTime<Utc>>) {
        match self.lock() {
            Ok(inner) => (inner.last_action, inner.last_action_time),
            Err(_) => (None, None),
        }
    }
}
