//! Host environment integration module
//!
//! Side effects on the host that are independent of the stopwatch state.

pub mod autostart;

// Re-export main types
pub use autostart::Autostart;
