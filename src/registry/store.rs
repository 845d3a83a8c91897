//! Topic to listener mapping.
//!
//! The registry holds [`Weak`] references only. Whoever registers a
//! listener keeps it alive; once the last strong reference is gone the entry
//! is skipped and pruned on the next fan-out for its topic.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::identifiers::SubscriptionId;
use crate::protocol::Topic;

use super::Listener;

// ============================================================================
// Types
// ============================================================================

/// One registration.
struct Entry {
    id: SubscriptionId,
    listener: Weak<dyn Listener>,
}

impl Entry {
    #[inline]
    fn is_live(&self) -> bool {
        self.listener.strong_count() > 0
    }
}

/// Result of [`Registry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// ID of the (possibly pre-existing) registration.
    pub id: SubscriptionId,
    /// `false` if the same listener was already registered for the topic.
    pub is_new: bool,
}

/// Result of [`Registry::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// No such registration.
    NotFound,
    /// Registration removed.
    Removed {
        /// Live listeners still registered for the topic.
        remaining: usize,
    },
}

// ============================================================================
// Registry
// ============================================================================

/// Mapping of topic to registered listeners, in registration order.
///
/// Insert and remove are atomic per entry. Shared by the session, the
/// dispatcher and every subscription handle.
#[derive(Default)]
pub struct Registry {
    topics: RwLock<FxHashMap<Topic, Vec<Entry>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `topic`.
    ///
    /// Registering the same listener twice for a topic is a no-op that
    /// returns the existing ID.
    pub fn insert(&self, topic: Topic, listener: &Arc<dyn Listener>) -> Registration {
        let weak = Arc::downgrade(listener);
        let mut topics = self.topics.write();
        let entries = topics.entry(topic).or_default();

        if let Some(existing) = entries
            .iter()
            .find(|entry| Weak::ptr_eq(&entry.listener, &weak))
        {
            return Registration {
                id: existing.id,
                is_new: false,
            };
        }

        let id = SubscriptionId::next();
        entries.push(Entry {
            id,
            listener: weak,
        });
        trace!(%topic, subscription = %id, "Registry insert");

        Registration { id, is_new: true }
    }

    /// Removes one registration.
    pub fn remove(&self, topic: Topic, id: SubscriptionId) -> Removal {
        let mut topics = self.topics.write();
        let Some(entries) = topics.get_mut(&topic) else {
            return Removal::NotFound;
        };

        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return Removal::NotFound;
        };
        entries.remove(index);

        let remaining = entries.iter().filter(|entry| entry.is_live()).count();
        if entries.is_empty() {
            topics.remove(&topic);
        }
        trace!(%topic, subscription = %id, remaining, "Registry remove");

        Removal::Removed { remaining }
    }

    /// Returns `true` if the registration is still present.
    #[must_use]
    pub fn contains(&self, topic: Topic, id: SubscriptionId) -> bool {
        self.topics
            .read()
            .get(&topic)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }

    /// Returns the live listeners for `topic` in registration order.
    ///
    /// The second value is `true` if dead entries were seen.
    #[must_use]
    pub fn snapshot(&self, topic: Topic) -> (Vec<(SubscriptionId, Arc<dyn Listener>)>, bool) {
        let topics = self.topics.read();
        let Some(entries) = topics.get(&topic) else {
            return (Vec::new(), false);
        };

        let mut live = Vec::with_capacity(entries.len());
        let mut saw_dead = false;
        for entry in entries {
            match entry.listener.upgrade() {
                Some(listener) => live.push((entry.id, listener)),
                None => saw_dead = true,
            }
        }
        (live, saw_dead)
    }

    /// Drops entries whose listener no longer exists.
    pub fn prune(&self, topic: Topic) {
        let mut topics = self.topics.write();
        if let Some(entries) = topics.get_mut(&topic) {
            entries.retain(Entry::is_live);
            if entries.is_empty() {
                topics.remove(&topic);
            }
        }
    }

    /// Topics with at least one live listener, in [`Topic`] order.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let topics = self.topics.read();
        let mut live: Vec<Topic> = topics
            .iter()
            .filter(|(_, entries)| entries.iter().any(Entry::is_live))
            .map(|(topic, _)| *topic)
            .collect();
        live.sort_unstable();
        live
    }

    /// Number of live listeners for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics
            .read()
            .get(&topic)
            .map_or(0, |entries| entries.iter().filter(|entry| entry.is_live()).count())
    }

    /// Returns `true` if no topic has a live listener.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics().is_empty()
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.topics.write().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
