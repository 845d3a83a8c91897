//! Realtime Channel - Multiplexed push session for dashboard clients.
//!
//! This library keeps one long-lived WebSocket to a backend and
//! multiplexes several logical topics over it. Consumers register
//! listeners per topic; the session routes every inbound frame to the
//! listeners of its topic.
//!
//! # Architecture
//!
//! - **Session**: Owns the socket, the heartbeat and the reconnect timer
//! - **Registry**: Topic → listeners, independent of the transport
//! - **Dispatcher**: Decodes frames and fans them out to listeners
//! - **Transport**: Opens links through a pluggable [`Connector`]
//!
//! Key design principles:
//!
//! - One socket per process, shared by every consumer
//! - Bounded flat-interval reconnection, reset on every successful open
//! - Every registered topic is resubscribed on each (re)connect
//! - A panicking listener never affects other listeners or the session
//!
//! # Quick Start
//!
//! ```no_run
//! use realtime_channel::{Result, Session, Topic};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .url("wss://dashboard.example.com/ws")
//!         .init()?;
//!
//!     let _prices = session.on_prices(|tick: &Value| {
//!         println!("price: {tick}");
//!     });
//!     let (_alerts, mut alerts) = session.subscribe_channel(Topic::Security);
//!
//!     while let Some(alert) = alerts.recv().await {
//!         println!("security alert: {alert}");
//!     }
//!
//!     session.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Envelope and topic types |
//! | [`registry`] | Listener registry and dispatcher |
//! | [`session`] | [`Session`] state machine and configuration |
//! | [`transport`] | [`Connector`] seam and WebSocket client |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire protocol: envelope codec and topics.
pub mod protocol;

/// Listener registry and inbound dispatch.
pub mod registry;

/// Session lifecycle, configuration and subscriptions.
///
/// Use [`Session::builder()`] to create a configured session.
pub mod session;

/// Link transport.
///
/// The [`Connector`] trait and its WebSocket implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{DecodeError, Error, Result};

// Identifier types
pub use identifiers::SubscriptionId;

// Protocol types
pub use protocol::{Envelope, Topic};

// Registry types
pub use registry::{DispatchOutcome, Dispatcher, Listener, Registry};

// Session types
pub use session::{Session, SessionBuilder, SessionConfig, SessionState, Subscription};

// Transport types
pub use transport::{Connector, Link, WebSocketConnector};
