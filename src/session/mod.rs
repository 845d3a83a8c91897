//! The real-time session.
//!
//! One [`Session`] owns one socket. It multiplexes every [`Topic`] over
//! that socket, keeps it alive with a heartbeat, and reconnects after
//! unexpected closes.
//!
//! # State Machine
//!
//! ```text
//!              connect()                open
//! Disconnected ─────────► Connecting ─────────► Connected
//!      ▲                      │                     │
//!      │    close / refused   │                     │ transport error
//!      ├──────────────────────┘                     ▼
//!      │                 close                    Error
//!      └─────────────────────────────────────────────┘
//! ```
//!
//! `disconnect()` passes through `Disconnecting` when a link is open.
//! After an unexpected close the session retries every
//! `reconnect_interval` until `max_reconnect_attempts` attempts fail in a
//! row. A successful open resets the counter.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | [`SessionConfig`] and [`SessionBuilder`] |
//! | `core` | [`Session`] state machine |
//! | `heartbeat` | [`Heartbeat`] timer |
//! | `hooks` | Per-topic subscribe helpers |
//! | `reconnect` | [`ReconnectPolicy`] |
//! | `state` | [`SessionState`] |
//! | `subscription` | [`Subscription`] handle |
//!
//! [`Topic`]: crate::Topic

// ============================================================================
// Submodules
// ============================================================================

/// Session configuration and builder.
pub mod config;

/// Session state machine.
mod core;

/// Heartbeat timer.
pub mod heartbeat;

/// Per-topic subscribe helpers.
mod hooks;

/// Reconnection policy.
pub mod reconnect;

/// Connection states.
pub mod state;

/// Subscription handles.
pub mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{SessionBuilder, SessionConfig};
pub use core::Session;
pub use heartbeat::Heartbeat;
pub use reconnect::{ReconnectDecision, ReconnectPolicy};
pub use state::SessionState;
pub use subscription::Subscription;
