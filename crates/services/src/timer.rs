//! Real-time drivers for the countdown state machine.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use lingo_core::{Countdown, Tick};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One-second interval for callers that own the session and tick it themselves.
///
/// The first tick fires one period after creation.
#[derive(Debug)]
pub struct Ticker {
    interval: Interval,
}

impl Ticker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a countdown running on its own task.
///
/// Publishes the remaining seconds on a watch channel and calls the expiry
/// callback once. Dropping the handle stops the task.
#[derive(Debug)]
pub struct CountdownDriver {
    remaining: watch::Receiver<Option<u32>>,
    task: JoinHandle<()>,
}

impl CountdownDriver {
    /// Start counting down from `limit_secs`. Untimed limits never expire.
    pub fn spawn<F>(limit_secs: Option<u32>, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let mut countdown = Countdown::new(limit_secs);
        countdown.start();
        let (tx, remaining) = watch::channel(countdown.remaining_secs());

        let task = tokio::spawn(async move {
            if !countdown.is_timed() {
                return;
            }
            let mut ticker = Ticker::new();
            loop {
                ticker.tick().await;
                match countdown.tick() {
                    Tick::Running { remaining } => {
                        tx.send_replace(Some(remaining));
                    }
                    Tick::Expired => {
                        tx.send_replace(Some(0));
                        tracing::info!("countdown expired");
                        on_expire();
                        return;
                    }
                    Tick::Idle | Tick::Suppressed => return,
                }
            }
        });

        Self { remaining, task }
    }

    /// Remaining seconds as last published; `None` when untimed.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        *self.remaining.borrow()
    }

    /// A receiver for rendering the countdown.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<u32>> {
        self.remaining.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the countdown without firing the callback.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
