//! Listener trait.

use serde_json::Value;

/// Receives payloads for one topic.
///
/// Topic listeners get the frame's `data`. Listeners on
/// [`Topic::System`](crate::Topic::System) get the whole envelope as JSON.
///
/// Implemented for every `Fn(&Value) + Send + Sync` closure.
pub trait Listener: Send + Sync + 'static {
    /// Handles one delivered payload.
    fn on_message(&self, payload: &Value);
}

impl<F> Listener for F
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    #[inline]
    fn on_message(&self, payload: &Value) {
        self(payload);
    }
}
