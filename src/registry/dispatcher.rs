//! Inbound frame routing.
//!
//! # Routing Rules
//!
//! | Frame | Delivered to |
//! |-------|--------------|
//! | `ping` / `pong` | nobody |
//! | `channel = T` (T ≠ `system`) | every `T` listener, with `data` |
//! | any other frame | every `system` listener, with the whole envelope |
//!
//! A `system` listener sees each frame once, even when the frame's own
//! channel is `system`. Listeners run one at a time in registration order; a
//! panicking listener is logged and skipped.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::protocol::{Envelope, Topic, decode};

use super::Registry;

// ============================================================================
// DispatchOutcome
// ============================================================================

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Frame was routed.
    Delivered {
        /// Listener invocations that returned normally.
        delivered: usize,
        /// Listener invocations that panicked.
        failed: usize,
    },
    /// Heartbeat frame, consumed.
    Heartbeat,
    /// Frame could not be decoded and was discarded.
    Dropped,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes decoded envelopes to the listeners registered at arrival time.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Decodes and routes one raw text frame.
    ///
    /// Malformed frames are logged and dropped. Never panics.
    pub fn dispatch_frame(&self, text: &str) -> DispatchOutcome {
        self.dispatch_frame_while(text, || true)
    }

    /// Like [`dispatch_frame`](Self::dispatch_frame), but stops the fan-out
    /// as soon as `live` returns `false`.
    ///
    /// `live` is checked before every listener call, outside any registry
    /// lock. A listener already running is not interrupted.
    pub fn dispatch_frame_while<F>(&self, text: &str, live: F) -> DispatchOutcome
    where
        F: Fn() -> bool,
    {
        match decode(text) {
            Ok(envelope) => self.route(&envelope, &live),
            Err(e) if e.is_unknown_channel() => {
                debug!(error = %e, "Dropping frame for unknown channel");
                DispatchOutcome::Dropped
            }
            Err(e) => {
                warn!(error = %e, len = text.len(), "Dropping malformed frame");
                DispatchOutcome::Dropped
            }
        }
    }

    /// Routes one decoded envelope.
    pub fn dispatch(&self, envelope: &Envelope) -> DispatchOutcome {
        self.route(envelope, &|| true)
    }

    fn route(&self, envelope: &Envelope, live: &dyn Fn() -> bool) -> DispatchOutcome {
        if envelope.is_heartbeat() {
            trace!(kind = %envelope.kind, "Heartbeat frame consumed");
            return DispatchOutcome::Heartbeat;
        }

        let mut delivered = 0;
        let mut failed = 0;

        if let Some(topic) = envelope.channel.filter(|topic| !topic.is_system()) {
            self.fan_out(topic, &envelope.data, live, &mut delivered, &mut failed);
        }

        if self.registry.subscriber_count(Topic::System) > 0 {
            match serde_json::to_value(envelope) {
                Ok(whole) => self.fan_out(Topic::System, &whole, live, &mut delivered, &mut failed),
                Err(e) => warn!(error = %e, "Failed to serialize envelope for system listeners"),
            }
        }

        trace!(kind = %envelope.kind, channel = ?envelope.channel, delivered, failed, "Frame dispatched");
        DispatchOutcome::Delivered { delivered, failed }
    }

    /// Invokes every live listener of `topic` with `payload`.
    fn fan_out(
        &self,
        topic: Topic,
        payload: &Value,
        live: &dyn Fn() -> bool,
        delivered: &mut usize,
        failed: &mut usize,
    ) {
        let (listeners, saw_dead) = self.registry.snapshot(topic);

        for (id, listener) in listeners {
            if !live() {
                trace!(%topic, "Fan-out stopped, link no longer current");
                break;
            }

            // Unregistered by an earlier listener of this same frame.
            if !self.registry.contains(topic, id) {
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| listener.on_message(payload))) {
                Ok(()) => *delivered += 1,
                Err(panic) => {
                    *failed += 1;
                    error!(
                        %topic,
                        subscription = %id,
                        panic = %panic_message(panic.as_ref()),
                        "Listener panicked"
                    );
                }
            }
        }

        if saw_dead {
            self.registry.prune(topic);
        }
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic.downcast_ref::<&str>().map_or_else(
        || {
            panic.downcast_ref::<String>().map_or_else(
                || "Unknown panic".to_string(),
                std::string::ToString::to_string,
            )
        },
        std::string::ToString::to_string,
    )
}

// ============================================================================
// Tests
// ============================================================================
