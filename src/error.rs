//! Error types for the real-time channel session.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use realtime_channel::{Result, Session};
//!
//! fn example() -> Result<Session> {
//!     let session = Session::builder()
//!         .url("wss://dashboard.example.com/ws")
//!         .build()?;
//!     Ok(session)
//! }
//! ```
//!
//! Most session operations never fail from the caller's point of view:
//! transport failures drive the reconnection policy and surface through the
//! session status, and malformed frames are logged and dropped.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Connection | [`Error::Connection`], [`Error::WebSocket`] |
//! | Protocol | [`Error::Decode`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// DecodeError
// ============================================================================

/// Reasons an inbound frame could not be turned into an envelope.
///
/// Decode errors are per-frame and never fatal: the session logs the
/// frame and continues.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The `type` field is missing or not a string.
    #[error("frame has no string `type` field")]
    MissingType,

    /// The `channel` field names a topic outside the closed set.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

impl DecodeError {
    /// Returns `true` if the frame was well-formed but addressed an unknown topic.
    #[inline]
    #[must_use]
    pub fn is_unknown_channel(&self) -> bool {
        matches!(self, Self::UnknownChannel(_))
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Session URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Link could not be established.
    ///
    /// Returned by custom connectors that cannot reach the remote end.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound frame could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error, including a failed handshake.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a frame decode error.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors are handled by retrying or dropping a frame;
    /// configuration errors are not.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.is_connection_error() || self.is_decode_error()
    }
}

// ============================================================================
// Tests
// ============================================================================
