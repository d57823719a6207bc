//! Persistence module
//!
//! Durable storage of the stopwatch state in a simple key-value store.

pub mod adapter;
pub mod store;

// Re-export main types
pub use adapter::{Persistence, ACCUMULATED_KEY, PHASE_KEY, RUNNING_SINCE_KEY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
