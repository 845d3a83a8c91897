//! Wire protocol types.
//!
//! This module defines the fixed JSON envelope exchanged over the session
//! socket and the closed set of topics it is multiplexed by.
//!
//! # Protocol Overview
//!
//! | Frame | Direction | Purpose |
//! |-------|-----------|---------|
//! | `{type:"subscribe", channel}` | Local → Remote | Start receiving a topic |
//! | `{type:"unsubscribe", channel}` | Local → Remote | Stop receiving a topic |
//! | `{type:"ping"}` | Local → Remote | Heartbeat |
//! | `{type:"pong"}` | Remote → Local | Heartbeat acknowledgement |
//! | `{type, channel, data, timestamp}` | Remote → Local | Application event |
//!
//! There is no version handshake; both ends assume this shape.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Envelope type and encode/decode |
//! | `topic` | Topic enumeration |

// ============================================================================
// Submodules
// ============================================================================

/// Envelope type and codec.
pub mod envelope;

/// Topic enumeration.
pub mod topic;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, decode, encode};
pub use topic::Topic;
