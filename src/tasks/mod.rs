//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod display;
pub mod save_retry;
pub mod ticker;

// Re-export main items
pub use display::display_task;
pub use save_retry::save_retry_task;
pub use ticker::{ticker_task, Ticker};
