//! Retry of failed saves, independent of the ticker

use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

/// Background task retrying a failed save every tick period until it succeeds.
///
/// The ticker only fires while running, so this covers failed saves of
/// `pause` and `reset` too.
pub async fn save_retry_task(state: Arc<AppState>) {
    info!("Starting save retry task");

    let mut dirty_rx = state.subscribe_dirty();
    let period = state.ticker().period();

    loop {
        if dirty_rx.wait_for(|dirty| *dirty).await.is_err() {
            debug!("Dirty flag closed, exiting save retry task");
            return;
        }

        let mut retries = interval(period);
        retries.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        retries.tick().await;

        loop {
            retries.tick().await;
            if state.retry_save() {
                info!("Stopwatch state saved after earlier failure");
                break;
            }
        }
    }
}
