//! Reconnection policy.
//!
//! A pure decision over the attempt counter. The session applies the
//! decision: it schedules the timer and stores the new counter.
//!
//! The interval is flat. The counter is reset by the session on every
//! successful open, so the budget is per reconnection episode.

use std::time::Duration;

use super::SessionConfig;

/// What to do after a link closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Call `connect()` again after `delay`; `attempt` is the new counter.
    Retry {
        /// Wait before the attempt.
        delay: Duration,
        /// Counter value after scheduling.
        attempt: u32,
    },
    /// Budget exhausted; stay disconnected until `reconnect()`.
    GiveUp {
        /// Attempts made in this episode.
        attempts: u32,
    },
    /// Closure was manual; never retry.
    Suppressed,
}

/// Bounded flat-interval reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    /// Creates a policy.
    #[inline]
    #[must_use]
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Creates the policy described by `config`.
    #[inline]
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.reconnect_interval(), config.max_reconnect_attempts)
    }

    /// Delay between attempts.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Attempts allowed per episode.
    #[inline]
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides the reaction to a close given the attempts made so far.
    #[must_use]
    pub const fn decide(&self, attempts: u32, manual: bool) -> ReconnectDecision {
        if manual {
            ReconnectDecision::Suppressed
        } else if attempts < self.max_attempts {
            ReconnectDecision::Retry {
                delay: self.interval,
                attempt: attempts + 1,
            }
        } else {
            ReconnectDecision::GiveUp { attempts }
        }
    }
}
