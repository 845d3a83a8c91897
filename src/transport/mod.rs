//! Transport layer.
//!
//! The session never touches a socket directly. A [`Connector`] opens a
//! [`Link`]: a pair of channels bridging the session to whatever task owns
//! the real socket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   Outbound    ┌──────────────┐               ┌──────────┐
//! │     Session     │──────────────►│  Link pump   │   WebSocket   │  Server  │
//! │                 │◄──────────────│  (tokio task)│◄─────────────►│          │
//! └─────────────────┘ TransportEvent└──────────────┘               └──────────┘
//! ```
//!
//! # Link Lifecycle
//!
//! 1. `Connector::connect` - Open the socket, spawn the pump, return a [`Link`]
//! 2. Session pushes [`Outbound::Frame`] text frames
//! 3. Pump forwards inbound text as [`TransportEvent::Frame`]
//! 4. Errors surface as [`TransportEvent::Error`]; the link may stay open
//! 5. [`TransportEvent::Closed`] (or the inbound channel ending) marks the link dead
//! 6. [`Outbound::Close`] asks the pump to close the socket
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | `tokio-tungstenite` connector |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket client connector.
pub mod websocket;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use websocket::WebSocketConnector;

// ============================================================================
// Types
// ============================================================================

/// Commands from the session to the link pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send one text frame.
    Frame(String),
    /// Close the socket.
    Close,
}

/// Notifications from the link pump to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Frame(String),
    /// The socket reported an error. Not a close by itself.
    Error(String),
    /// The socket closed.
    Closed,
}

// ============================================================================
// Link
// ============================================================================

/// An open connection, seen from the session side.
#[derive(Debug)]
pub struct Link {
    /// Frames to the remote end.
    pub outbound: mpsc::UnboundedSender<Outbound>,
    /// Events from the remote end. Ends when the pump exits.
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Link {
    /// Creates a link and the pump-side channel ends.
    #[must_use]
    pub fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<Outbound>,
        mpsc::UnboundedSender<TransportEvent>,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let link = Self {
            outbound: outbound_tx,
            inbound: inbound_rx,
        };
        (link, outbound_rx, inbound_tx)
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens links to the remote end.
///
/// Implemented by [`WebSocketConnector`] for production use. The session
/// calls `connect` once per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a new link to `url`.
    ///
    /// # Errors
    ///
    /// Returns a connection error ([`Error::is_connection_error`]) if the
    /// remote end cannot be reached.
    ///
    /// [`Error::is_connection_error`]: crate::Error::is_connection_error
    async fn connect(&self, url: &Url) -> Result<Link>;
}
