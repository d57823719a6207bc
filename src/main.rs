//! CountUp - A background stopwatch that survives restarts
//!
//! This is the main entry point for the countup daemon.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, warn};

use countup::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    persistence::JsonFileStore,
    services::Autostart,
    state::AppState,
    tasks::{display_task, save_retry_task, ticker_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so the live display owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(format!("countup={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting countup v{}", env!("CARGO_PKG_VERSION"));

    let state_file = config.state_file();
    info!("Configuration: host={}, port={}, state={}, tick={}ms, strict={}",
          config.host, config.port, state_file.display(), config.tick_ms, config.strict);

    let mut app_state = AppState::new(
        Arc::new(SystemClock),
        Box::new(JsonFileStore::new(state_file)),
        config.engine_options(),
    );
    match Autostart::for_current_user() {
        Ok(autostart) => app_state = app_state.with_autostart(autostart),
        Err(e) => warn!("Launch at login unavailable: {}", e),
    }
    let state = Arc::new(app_state);

    // Start the ticker background task
    tokio::spawn(ticker_task(Arc::clone(&state)));

    // Retry failed saves whatever the phase
    tokio::spawn(save_retry_task(Arc::clone(&state)));

    let display = if config.no_display {
        None
    } else {
        Some(tokio::spawn(display_task(
            state.subscribe_display(),
            state.subscribe_shutdown(),
        )))
    };

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Command API listening on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start            - Start a fresh session");
    info!("  POST /pause            - Pause the running stopwatch");
    info!("  POST /resume           - Resume a paused stopwatch");
    info!("  POST /reset            - Reset to 0:00");
    info!("  POST /quit             - Save and exit");
    info!("  GET  /status           - Current time, phase and available actions");
    info!("  GET  /launch-at-login  - Query launch at login");
    info!("  POST /launch-at-login  - Toggle launch at login");
    info!("  GET  /health           - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
        _ = state.quit_requested() => {
            info!("Quit command received");
        }
    }

    state.shutdown();

    if let Some(display) = display {
        if tokio::time::timeout(Duration::from_secs(1), display).await.is_err() {
            warn!("Terminal display did not finish in time");
        }
    }

    info!("Shutdown complete");
    Ok(())
}
