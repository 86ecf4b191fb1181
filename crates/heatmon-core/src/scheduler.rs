//! Cancellable periodic poll task
//!
//! Each device owns one [`PollScheduler`]. The scheduler replaces the
//! ambient timer-closure style with an explicit task object tied to the
//! device's lifecycle:
//!
//! - `start` spawns the periodic task
//! - `restart` swaps the interval without a tick firing in the gap and
//!   without old/new tasks overlapping
//! - `stop` cancels the task and is safe to call repeatedly
//!
//! The scheduler does not correct drift; every tick simply triggers one
//! poll pass at the configured cadence. The first tick fires one full
//! interval after `start`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

type TickFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Cancellable periodic task owner
pub struct PollScheduler {
    task: Option<JoinHandle<()>>,
    tick: Option<TickFn>,
    interval: Option<Duration>,
}

impl PollScheduler {
    /// Create a scheduler with no running task
    pub fn new() -> Self {
        Self {
            task: None,
            tick: None,
            interval: None,
        }
    }

    /// Start the periodic task
    ///
    /// Cancels any task already running, retains the callback for later
    /// restarts, and begins ticking at `interval`.
    pub fn start<F, Fut>(&mut self, interval: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let tick: TickFn = Arc::new(move || Box::pin(tick()));
        self.stop();
        self.tick = Some(tick.clone());
        self.spawn(interval, tick);
    }

    /// Restart the task with a new interval
    ///
    /// The existing task is cancelled before the new one is spawned, so
    /// no tick fires in between and the tasks never overlap. Requires a
    /// prior `start`.
    pub fn restart(&mut self, interval: Duration) {
        let Some(tick) = self.tick.clone() else {
            warn!("restart requested before start, ignoring");
            return;
        };

        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.spawn(interval, tick);
    }

    /// Cancel the task
    ///
    /// Idempotent: stopping an already stopped scheduler is a no-op.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("cancelling poll task");
            task.abort();
        }
    }

    /// Whether a task is currently scheduled
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// The currently configured interval, if started
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    fn spawn(&mut self, interval: Duration, tick: TickFn) {
        debug!(?interval, "starting poll task");
        self.interval = Some(interval);

        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately on the first tick; consume it
            // so the first poll fires one full interval after start
            timer.tick().await;

            loop {
                timer.tick().await;
                tick().await;
            }
        });

        self.task = Some(handle);
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
