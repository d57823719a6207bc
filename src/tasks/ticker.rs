//! Periodic display refresh while the stopwatch is running

use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Shortest accepted tick period
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(10);

/// Handle controlling whether the ticker task is firing.
///
/// The ticker itself knows nothing about elapsed time. Its driving receiver
/// can be claimed by [`Ticker::run`] only once, so starting an already
/// started ticker never creates a second timer.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    active_tx: watch::Sender<bool>,
    /// Taken by the single driving task
    driver_rx: Mutex<Option<watch::Receiver<bool>>>,
}

impl Ticker {
    /// Create a stopped ticker firing every `period` once started
    pub fn new(period: Duration) -> Self {
        let (active_tx, driver_rx) = watch::channel(false);
        Self {
            period: period.max(MIN_TICK_PERIOD),
            active_tx,
            driver_rx: Mutex::new(Some(driver_rx)),
        }
    }

    /// Time between ticks while active
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start firing. Returns false if already active.
    pub fn start(&self) -> bool {
        self.active_tx.send_if_modified(|active| {
            if *active {
                false
            } else {
                *active = true;
                true
            }
        })
    }

    /// Stop firing. Returns false if already stopped.
    pub fn stop(&self) -> bool {
        self.active_tx.send_if_modified(|active| {
            if *active {
                *active = false;
                true
            } else {
                false
            }
        })
    }

    /// Whether the ticker is currently firing
    pub fn is_active(&self) -> bool {
        *self.active_tx.borrow()
    }

    /// Observe the active flag without driving any timer
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.active_tx.subscribe()
    }

    /// Drive `on_tick` from this ticker's active flag.
    ///
    /// Returns `None` if the ticker is already being driven.
    pub fn run<F>(&self, on_tick: F) -> Option<impl Future<Output = ()> + Send + 'static>
    where
        F: FnMut() + Send + 'static,
    {
        let driver_rx = self.driver_rx.lock().ok().and_then(|mut driver| driver.take())?;
        Some(run_ticker(driver_rx, self.period, on_tick))
    }
}

/// Invoke `on_tick` every `period` while the watched flag is true.
///
/// The interval is dropped as soon as the flag goes false, and the loop
/// returns once the sending side is gone.
pub async fn run_ticker<F>(mut active_rx: watch::Receiver<bool>, period: Duration, mut on_tick: F)
where
    F: FnMut(),
{
    loop {
        if !*active_rx.borrow_and_update() {
            if active_rx.changed().await.is_err() {
                debug!("Ticker handle dropped, exiting");
                return;
            }
            continue;
        }

        debug!("Ticker active every {:?}", period);
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticks.tick() => on_tick(),

                changed = active_rx.changed() => {
                    if changed.is_err() {
                        debug!("Ticker handle dropped, exiting");
                        return;
                    }
                    if !*active_rx.borrow_and_update() {
                        debug!("Ticker stopped");
                        break;
                    }
                }
            }
        }
    }
}

/// Background task refreshing the stopwatch display while it runs
pub async fn ticker_task(state: Arc<AppState>) {
    info!("Starting ticker task every {:?}", state.ticker().period());

    let tick_state = Arc::clone(&state);
    match state.ticker().run(move || tick_state.tick()) {
        Some(ticking) => ticking.await,
        None => warn!("Ticker is already driven by another task"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn counting_ticker(period: Duration) -> (Ticker, Arc<AtomicUsize>) {
        let ticker = Ticker::new(period);
        let count = Arc::new(AtomicUsize::new(0));
        let task_count = Arc::clone(&count);
        let ticking = ticker
            .run(move || {
                task_count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        tokio::spawn(ticking);
        (ticker, count)
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let ticker = Ticker::new(Duration::from_secs(1));

        assert!(!ticker.stop());
        assert!(ticker.start());
        assert!(!ticker.start());
        assert!(ticker.is_active());
        assert!(ticker.stop());
        assert!(!ticker.stop());
        assert!(!ticker.is_active());
    }

    #[test]
    fn period_has_a_floor() {
        assert_eq!(Ticker::new(Duration::ZERO).period(), MIN_TICK_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_fire_until_started() {
        let (_ticker, count) = counting_ticker(Duration::from_secs(1));

        sleep(Duration::from_secs(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_while_active_and_halts_when_stopped() {
        let (ticker, count) = counting_ticker(Duration::from_secs(1));

        ticker.start();
        sleep(Duration::from_millis(3500)).await;
        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 3, "expected at least 3 ticks, got {}", fired);

        ticker.stop();
        tokio::task::yield_now().await;
        let after_stop = count.load(Ordering::SeqCst);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_a_single_timer() {
        let (ticker, count) = counting_ticker(Duration::from_secs(1));

        ticker.start();
        ticker.start();
        sleep(Duration::from_millis(4500)).await;

        // one interval fires immediately and then once per second
        assert!(count.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn second_driver_is_refused() {
        let (ticker, count) = counting_ticker(Duration::from_secs(1));
        let extra = Arc::clone(&count);

        assert!(ticker
            .run(move || {
                extra.fetch_add(1, Ordering::SeqCst);
            })
            .is_none());

        ticker.start();
        sleep(Duration::from_millis(2500)).await;

        // 0s, 1s and 2s from the only interval
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_handle_is_dropped() {
        let ticker = Ticker::new(Duration::from_secs(1));
        let task = tokio::spawn(ticker.run(|| {}).unwrap());

        ticker.start();
        sleep(Duration::from_secs(2)).await;
        drop(ticker);

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("ticker task should exit")
            .unwrap();
    }
}
