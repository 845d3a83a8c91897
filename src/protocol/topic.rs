//! Channel topics carried over the session.
//!
//! One socket carries every topic. The set is closed: inbound frames that
//! name any other channel are dropped by the codec.
//!
//! | Topic | Wire name |
//! |-------|-----------|
//! | [`Topic::Transactions`] | `transactions` |
//! | [`Topic::Prices`] | `prices` |
//! | [`Topic::Security`] | `security` |
//! | [`Topic::UserActivity`] | `user_activity` |
//! | [`Topic::System`] | `system` |
//! | [`Topic::Notifications`] | `notifications` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

// ============================================================================
// Topic
// ============================================================================

/// A named subdivision of the session's traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Transaction feed.
    Transactions,
    /// Price ticks.
    Prices,
    /// Security events and alerts.
    Security,
    /// User activity stream.
    UserActivity,
    /// System status. Listeners on this topic also act as a catch-all.
    System,
    /// User notifications.
    Notifications,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Topic; 6] = [
        Topic::Transactions,
        Topic::Prices,
        Topic::Security,
        Topic::UserActivity,
        Topic::System,
        Topic::Notifications,
    ];

    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Prices => "prices",
            Self::Security => "security",
            Self::UserActivity => "user_activity",
            Self::System => "system",
            Self::Notifications => "notifications",
        }
    }

    /// Returns `true` for the reserved catch-all topic.
    #[inline]
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownChannel(s.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_matches_wire_names() {
        for topic in Topic::ALL {
            assert_eq!(topic.as_str().parse::<Topic>().expect("parse"), topic);
        }
    }

    #[test]
    fn test_unknown_topic() {
        let err = "weather".parse::<Topic>().unwrap_err();
        assert!(err.is_unknown_channel());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Topic::UserActivity).expect("serialize");
        assert_eq!(json, "\"user_activity\"");
    }

    #[test]
    fn test_only_system_is_catch_all() {
        let catch_all: Vec<_> = Topic::ALL.into_iter().filter(Topic::is_system).collect();
        assert_eq!(catch_all, vec![Topic::System]);
    }
}
