//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{Action, StopwatchSnapshot, TransitionOutcome};

/// API response structure for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub stopwatch: StopwatchSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, stopwatch: StopwatchSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            stopwatch,
        }
    }

    /// Describe the outcome of a transition request
    pub fn from_outcome(outcome: TransitionOutcome) -> Self {
        if outcome.applied {
            let message = format!("Stopwatch {}", outcome.snapshot.phase);
            Self::new("applied".to_string(), message, outcome.snapshot)
        } else {
            let message = format!(
                "Cannot {} while {}, nothing changed",
                outcome.action, outcome.snapshot.phase
            );
            Self::new("ignored".to_string(), message, outcome.snapshot)
        }
    }

    /// Create a quitting response
    pub fn quitting(stopwatch: StopwatchSnapshot) -> Self {
        Self::new(
            "quitting".to_string(),
            "Saving state and shutting down".to_string(),
            stopwatch,
        )
    }
}

/// Status response with ticker and menu information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub stopwatch: StopwatchSnapshot,
    /// Commands a menu would offer from the current phase
    pub actions: Vec<Action>,
    pub ticker_active: bool,
    pub uptime: String,
    pub last_action: Option<Action>,
    pub last_action_time: Option<DateTime<Utc>>,
    pub launch_at_login: Option<bool>,
}

/// Launch-at-login request and response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchAtLogin {
    pub enabled: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
