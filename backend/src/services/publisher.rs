//! Periodic publish timer
//!
//! Drives progress publication for a running job. The timer posts tick
//! events tagged with its generation into the coordinator, which ignores
//! ticks from any timer other than the current one.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Default interval between progress publications
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(100);

/// Tick event posted by a [`PublishTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishTick {
    pub generation: u64,
}

/// Configuration for the publish timer
#[derive(Debug, Clone)]
pub struct PublishTimerConfig {
    /// Interval between ticks (default: 100 milliseconds)
    pub interval: Duration,
}

impl Default for PublishTimerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}

/// Background timer feeding publish ticks into a coordinator
pub struct PublishTimer {
    generation: u64,
    config: PublishTimerConfig,
    ticks: mpsc::UnboundedSender<PublishTick>,
}

impl PublishTimer {
    pub fn new(
        generation: u64,
        config: PublishTimerConfig,
        ticks: mpsc::UnboundedSender<PublishTick>,
    ) -> Self {
        Self {
            generation,
            config,
            ticks,
        }
    }

    /// Start the timer
    ///
    /// Returns a shutdown sender. Sending `true` or dropping it stops the
    /// timer.
    pub fn start(self) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let generation = self.generation;
        let interval = self.config.interval;
        let ticks = self.ticks;

        tokio::spawn(async move {
            debug!(generation, "Starting publish timer with interval {:?}", interval);

            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        if ticks.send(PublishTick { generation }).is_err() {
                            info!(generation, "Publish timer lost its coordinator");
                            break;
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!(generation, "Publish timer shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(generation: u64) -> (PublishTimer, mpsc::UnboundedReceiver<PublishTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = PublishTimerConfig {
            interval: Duration::from_millis(100),
        };
        (PublishTimer::new(generation, config, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_carry_generation() {
        let (timer, mut rx) = timer(7);
        let _shutdown = timer.start();

        let started = tokio::time::Instant::now();
        assert_eq!(rx.recv().await, Some(PublishTick { generation: 7 }));
        assert_eq!(rx.recv().await, Some(PublishTick { generation: 7 }));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_stops_ticks() {
        let (timer, mut rx) = timer(1);
        let shutdown = timer.start();

        assert!(rx.recv().await.is_some());
        shutdown.send(true).unwrap();

        // The sender inside the task is dropped once the loop exits.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_shutdown_sender_stops_ticks() {
        let (timer, mut rx) = timer(1);
        drop(timer.start());

        assert_eq!(rx.recv().await, None);
    }
}
