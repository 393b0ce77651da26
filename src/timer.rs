//! Repeating view-refresh timer
//!
//! Each timer carries a generation number that is stamped on every tick it
//! emits, so ticks already queued when the timer is cancelled can be told
//! apart from ticks of a newer timer.

use log::trace;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct RefreshTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl RefreshTimer {
    /// Start ticking every `interval` on the current Tokio runtime
    ///
    /// `on_tick` returns `false` once nobody is listening, which ends the task.
    pub fn start<F>(generation: u64, interval: Duration, on_tick: F) -> Self
    where
        F: Fn(u64) -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; the caller already refreshed.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !on_tick(generation) {
                    trace!("Refresh timer {} has no listener, stopping", generation);
                    break;
                }
            }
        });

        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the timer. No tick is emitted after this returns.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
