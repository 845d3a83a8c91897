//! Session states.

use std::fmt;

/// Lifecycle state of the session link.
///
/// ```text
/// disconnected ──connect()──► connecting ──open──► connected
///      ▲                          │                  │   │
///      │◄──────── fail/close ─────┘                  │   │ disconnect()
///      │◄──────────────── close ─────────────────────┘   ▼
///      └──────────────────────────────────────────── disconnecting
/// ```
///
/// `error` is entered on any transport error and left on the close that
/// follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No link, none being opened.
    #[default]
    Disconnected,
    /// Link being opened.
    Connecting,
    /// Link open.
    Connected,
    /// Manual disconnect in progress.
    Disconnecting,
    /// Transport reported an error.
    Error,
}

impl SessionState {
    /// Returns the lowercase state name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Error => "error",
        }
    }

    /// Returns `true` while a link is open or being opened.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
