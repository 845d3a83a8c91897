//! Session configuration and builder.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use realtime_channel::Session;
//!
//! # async fn example() -> realtime_channel::Result<()> {
//! let session = Session::builder()
//!     .url("wss://dashboard.example.com/ws")
//!     .reconnect_interval(Duration::from_secs(3))
//!     .max_reconnect_attempts(5)
//!     .heartbeat_interval(Duration::from_secs(30))
//!     .init()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`SessionConfig`] also deserializes from the camelCase JSON object the
//! host application passes around:
//!
//! ```json
//! {
//!   "url": "wss://dashboard.example.com/ws",
//!   "autoConnect": true,
//!   "reconnectInterval": 3000,
//!   "maxReconnectAttempts": 5,
//!   "heartbeatInterval": 30000
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connector, WebSocketConnector};

use super::Session;

// ============================================================================
// Constants
// ============================================================================

/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3_000;

/// Default attempts per reconnection episode.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

// ============================================================================
// SessionConfig
// ============================================================================

/// Settings accepted at session construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Endpoint, `ws://` or `wss://`.
    pub url: Url,

    /// Connect as part of [`Session::init`].
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,

    /// Delay between reconnection attempts, in milliseconds.
    #[serde(rename = "reconnectInterval", default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Attempts per reconnection episode.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Heartbeat period in milliseconds; 0 disables the heartbeat.
    #[serde(rename = "heartbeatInterval", default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_auto_connect() -> bool {
    true
}

fn default_reconnect_interval_ms() -> u64 {
    DEFAULT_RECONNECT_INTERVAL_MS
}

fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

fn default_heartbeat_interval_ms() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_MS
}

impl SessionConfig {
    /// Creates a config for `url` with default timings.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` does not parse
    /// - [`Error::Config`] if the scheme is not `ws`/`wss`
    pub fn new(url: &str) -> Result<Self> {
        let config = Self {
            url: Url::parse(url)?,
            auto_connect: default_auto_connect(),
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON config object.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not a valid config object
    /// - [`Error::Config`] if validation fails
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the session relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a non-WebSocket scheme or a zero
    /// reconnect interval.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "URL scheme must be ws or wss, got '{}'",
                self.url.scheme()
            )));
        }

        if self.reconnect_interval_ms == 0 {
            return Err(Error::config("reconnect interval must be greater than zero"));
        }

        Ok(())
    }

    /// Delay between reconnection attempts.
    #[inline]
    #[must_use]
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Heartbeat period; zero when disabled.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`].
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Default)]
pub struct SessionBuilder {
    url: Option<String>,
    auto_connect: Option<bool>,
    reconnect_interval: Option<Duration>,
    max_reconnect_attempts: Option<u32>,
    heartbeat_interval: Option<Duration>,
    connector: Option<Arc<dyn Connector>>,
}

impl SessionBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets whether [`init`](Self::init) connects immediately.
    #[inline]
    #[must_use]
    pub fn auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = Some(auto_connect);
        self
    }

    /// Sets the delay between reconnection attempts.
    #[inline]
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = Some(interval);
        self
    }

    /// Sets the attempts allowed per reconnection episode.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Sets the heartbeat period. [`Duration::ZERO`] disables it.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Replaces the default [`WebSocketConnector`].
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Validates and returns the config without building a session.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no URL was set or validation fails
    /// - [`Error::InvalidUrl`] if the URL does not parse
    pub fn config(&self) -> Result<SessionConfig> {
        let url = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Session URL is required. Use .url() to set it.\n\
                 Example: Session::builder().url(\"wss://host/ws\")",
            )
        })?;

        let mut config = SessionConfig::new(url)?;
        if let Some(auto_connect) = self.auto_connect {
            config.auto_connect = auto_connect;
        }
        if let Some(interval) = self.reconnect_interval {
            config.reconnect_interval_ms = duration_ms(interval);
        }
        if let Some(attempts) = self.max_reconnect_attempts {
            config.max_reconnect_attempts = attempts;
        }
        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval_ms = duration_ms(interval);
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the session without connecting.
    ///
    /// # Errors
    ///
    /// See [`config`](Self::config).
    pub fn build(self) -> Result<Session> {
        let config = self.config()?;
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector::new()));
        Ok(Session::new(config, connector))
    }

    /// Builds the session and connects it if `auto_connect` is set.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// See [`config`](Self::config).
    pub fn init(self) -> Result<Session> {
        let config = self.config()?;
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector::new()));
        Ok(Session::init(config, connector))
    }
}

/// Whole milliseconds in `duration`, saturating.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("ws://localhost:8080/ws").expect("config");
        assert!(config.auto_connect);
        assert_eq!(config.reconnect_interval(), Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = SessionConfig::new("https://example.com").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_unparsable_url() {
        let err = SessionConfig::new("::nope").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_from_json_camel_case() {
        let config = SessionConfig::from_json(
            r#"{
                "url": "wss://dash.example.com/ws",
                "autoConnect": false,
                "reconnectInterval": 100,
                "maxReconnectAttempts": 2,
                "heartbeatInterval": 0
            }"#,
        )
        .expect("config");

        assert!(!config.auto_connect);
        assert_eq!(config.reconnect_interval(), Duration::from_millis(100));
        assert_eq!(config.max_reconnect_attempts, 2);
        assert!(config.heartbeat_interval().is_zero());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SessionConfig::from_json(r#"{"url":"ws://h/ws"}"#).expect("config");
        assert_eq!(config, SessionConfig::new("ws://h/ws").expect("config"));
    }

    #[test]
    fn test_from_json_validates() {
        let err = SessionConfig::from_json(r#"{"url":"ws://h/ws","reconnectInterval":0}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_requires_url() {
        let err = SessionBuilder::new().config().unwrap_err();
        assert!(err.to_string().contains("URL is required"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionBuilder::new()
            .url("ws://localhost/ws")
            .auto_connect(false)
            .reconnect_interval(Duration::from_millis(250))
            .max_reconnect_attempts(9)
            .heartbeat_interval(Duration::ZERO)
            .config()
            .expect("config");

        assert!(!config.auto_connect);
        assert_eq!(config.reconnect_interval_ms, 250);
        assert_eq!(config.max_reconnect_attempts, 9);
        assert_eq!(config.heartbeat_interval_ms, 0);
    }
}
