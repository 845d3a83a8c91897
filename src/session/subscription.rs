//! Subscription handles.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::identifiers::SubscriptionId;
use crate::protocol::Topic;
use crate::registry::Listener;

use super::core::SessionShared;

/// Handle to one registered listener.
///
/// Dropping the handle, or calling [`unsubscribe`](Self::unsubscribe),
/// removes the registration. Frames decoded after that never reach the
/// listener.
///
/// Registering the same listener twice for a topic yields two handles for
/// one registration; either one removes it.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    session: Weak<SessionShared>,
    topic: Topic,
    id: SubscriptionId,
    /// Owns closure listeners, which nothing else references.
    keepalive: Option<Arc<dyn Listener>>,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(
        session: Weak<SessionShared>,
        topic: Topic,
        id: SubscriptionId,
        keepalive: Option<Arc<dyn Listener>>,
    ) -> Self {
        Self {
            session,
            topic,
            id,
            keepalive,
            active: true,
        }
    }

    /// Registration ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Subscribed topic.
    #[inline]
    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Removes the registration.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::take(&mut self.active) {
            return;
        }
        if let Some(session) = self.session.upgrade() {
            session.remove_listener(self.topic, self.id);
        }
        self.keepalive = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
