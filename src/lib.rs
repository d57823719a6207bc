//! CountUp - A background stopwatch that survives restarts
//!
//! This library provides the stopwatch engine (state machine, elapsed-time
//! accounting, ticker and persistence) and the HTTP command API around it.

pub mod api;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod persistence;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use display::format_elapsed;
pub use error::{PersistenceError, StopwatchError};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, Persistence};
pub use state::{AppState, EngineOptions, Phase, StopwatchState};
pub use utils::signals::shutdown_signal;
