//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    error::StopwatchError,
    state::{Action, AppState},
};
use super::responses::{ApiResponse, HealthResponse, LaunchAtLogin, StatusResponse};

/// Run one transition on the blocking pool and map the outcome to a response.
///
/// The transition saves to disk while holding the state lock, so it stays off
/// the async worker threads.
async fn run_action(state: Arc<AppState>, action: Action) -> Result<Json<ApiResponse>, StatusCode> {
    let result = match tokio::task::spawn_blocking(move || state.apply(action)).await {
        Ok(result) => result,
        Err(e) => {
            error!("Stopwatch {} task failed: {}", action, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match result {
        Ok(outcome) => Ok(Json(ApiResponse::from_outcome(outcome))),
        Err(StopwatchError::InvalidTransition { action, phase }) => {
            info!("Rejected {} request while {}", action, phase);
            Err(StatusCode::CONFLICT)
        }
        Err(e) => {
            error!("Failed to {} stopwatch: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /start - Begin a fresh session
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    run_action(state, Action::Start).await
}

/// Handle POST /pause - Bank the running interval
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    run_action(state, Action::Pause).await
}

/// Handle POST /resume - Continue a paused session
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    run_action(state, Action::Resume).await
}

/// Handle POST /reset - Back to 0:00
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    run_action(state, Action::Reset).await
}

/// Handle POST /quit - Save and shut down
pub async fn quit_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ApiResponse>), StatusCode> {
    let snapshot = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to read stopwatch before quitting: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    state.request_quit();
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::quitting(snapshot))))
}

/// Handle GET /status - Return current stopwatch status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let stopwatch = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get stopwatch state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        actions: stopwatch.phase.available_actions().to_vec(),
        stopwatch,
        ticker_active: state.ticker().is_active(),
        uptime: state.get_uptime(),
        last_action,
        last_action_time,
        launch_at_login: state.autostart().map(|autostart| autostart.is_enabled()),
    }))
}

/// Handle GET /launch-at-login - Report whether an autostart entry exists
pub async fn launch_at_login_status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LaunchAtLogin>, StatusCode> {
    match state.autostart() {
        Some(autostart) => Ok(Json(LaunchAtLogin {
            enabled: autostart.is_enabled(),
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Handle POST /launch-at-login - Enable or disable the autostart entry
pub async fn launch_at_login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LaunchAtLogin>,
) -> Result<Json<LaunchAtLogin>, StatusCode> {
    let Some(autostart) = state.autostart().cloned() else {
        warn!("Launch at login requested but unavailable on this host");
        return Err(StatusCode::NOT_FOUND);
    };

    let toggled = tokio::task::spawn_blocking(move || autostart.set_enabled(request.enabled)).await;

    match toggled {
        Ok(Ok(enabled)) => Ok(Json(LaunchAtLogin { enabled })),
        Ok(Err(e)) => {
            error!("Failed to toggle launch at login: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            error!("Failed to toggle launch at login: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
