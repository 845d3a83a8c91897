//! Heartbeat timer.
//!
//! Calls a beat function every period until it returns `false` or the
//! timer is stopped. The first beat fires one full period after start.
//!
//! There is no pong tracking: a half-open socket is only noticed when the
//! transport itself reports a close.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::trace;

/// A running heartbeat. Stopped on drop.
#[derive(Debug)]
pub struct Heartbeat {
    task: JoinHandle<()>,
}

impl Heartbeat {
    /// Starts a heartbeat, or returns `None` when `period` is zero.
    ///
    /// `beat` returns `false` to end the heartbeat from inside.
    pub fn start<F>(period: Duration, beat: F) -> Option<Self>
    where
        F: Fn() -> bool + Send + 'static,
    {
        if period.is_zero() {
            return None;
        }

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !beat() {
                    trace!("Heartbeat ended by beat");
                    break;
                }
            }
        });

        Some(Self { task })
    }

    /// Stops the heartbeat. No beat runs after this returns, unless one is
    /// already executing on another thread.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter() -> (Arc<AtomicU32>, impl Fn() -> bool + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let beats = Arc::clone(&count);
        (count, move || {
            beats.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_disables() {
        let (count, beat) = counter();
        assert!(Heartbeat::start(Duration::ZERO, beat).is_none());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_beats_every_period() {
        let (count, beat) = counter();
        let heartbeat = Heartbeat::start(Duration::from_secs(1), beat).expect("enabled");

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        heartbeat.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_beat_can_end_heartbeat() {
        let count = Arc::new(AtomicU32::new(0));
        let beats = Arc::clone(&count);
        let _heartbeat = Heartbeat::start(Duration::from_secs(1), move || {
            beats.fetch_add(1, Ordering::SeqCst) < 1
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops() {
        let (count, beat) = counter();
        drop(Heartbeat::start(Duration::from_secs(1), beat));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
