//! Wire envelope and codec.
//!
//! Every frame on the socket, in both directions, is one JSON object:
//!
//! ```json
//! {
//!   "type": "transaction_created",
//!   "channel": "transactions",
//!   "data": { ... },
//!   "timestamp": "2026-10-16T09:30:00.000Z"
//! }
//! ```
//!
//! Control frames use the reserved types `ping`, `pong`, `subscribe` and
//! `unsubscribe`. Anything else is an application frame routed by `channel`.
//!
//! The shape is fixed. Decoding ignores unknown fields and defaults the
//! optional ones; it fails only when the payload is not a JSON object, has
//! no string `type`, or names a channel outside [`Topic`].

// ============================================================================
// Imports
// ============================================================================

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DecodeError, Result};

use super::Topic;

// ============================================================================
// Constants
// ============================================================================

/// Heartbeat request type.
pub const PING: &str = "ping";

/// Heartbeat acknowledgement type.
pub const PONG: &str = "pong";

/// Subscription request type.
pub const SUBSCRIBE: &str = "subscribe";

/// Unsubscription request type.
pub const UNSUBSCRIBE: &str = "unsubscribe";

// ============================================================================
// Envelope
// ============================================================================

/// One frame of the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Frame type: a control type or an application event name.
    #[serde(rename = "type")]
    pub kind: String,

    /// Target topic, absent on heartbeat frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Topic>,

    /// Opaque payload.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,

    /// ISO 8601 timestamp set by the sender.
    pub timestamp: String,
}

// ============================================================================
// Envelope - Constructors
// ============================================================================

impl Envelope {
    /// Creates an envelope stamped with the current time.
    #[must_use]
    pub fn new(kind: impl Into<String>, channel: Option<Topic>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            channel,
            data,
            timestamp: now_timestamp(),
        }
    }

    /// Creates an application frame for a topic.
    #[inline]
    #[must_use]
    pub fn message(kind: impl Into<String>, channel: Topic, data: Value) -> Self {
        Self::new(kind, Some(channel), data)
    }

    /// Creates a heartbeat `ping`.
    #[inline]
    #[must_use]
    pub fn ping() -> Self {
        Self::new(PING, None, Value::Null)
    }

    /// Creates a `subscribe` control frame.
    #[inline]
    #[must_use]
    pub fn subscribe(channel: Topic) -> Self {
        Self::new(SUBSCRIBE, Some(channel), Value::Null)
    }

    /// Creates an `unsubscribe` control frame.
    #[inline]
    #[must_use]
    pub fn unsubscribe(channel: Topic) -> Self {
        Self::new(UNSUBSCRIBE, Some(channel), Value::Null)
    }
}

// ============================================================================
// Envelope - Predicates
// ============================================================================

impl Envelope {
    /// Returns `true` for a heartbeat acknowledgement.
    #[inline]
    #[must_use]
    pub fn is_pong(&self) -> bool {
        self.kind == PONG
    }

    /// Returns `true` for a heartbeat request.
    #[inline]
    #[must_use]
    pub fn is_ping(&self) -> bool {
        self.kind == PING
    }

    /// Returns `true` for `ping`/`pong`, which never reach listeners.
    #[inline]
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        self.is_ping() || self.is_pong()
    }

    /// Returns `true` for any of the reserved control types.
    #[inline]
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self.kind.as_str(), PING | PONG | SUBSCRIBE | UNSUBSCRIBE)
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Serializes an envelope to its JSON text form.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn encode(envelope: &Envelope) -> Result<String> {
    Ok(serde_json::to_string(envelope)?)
}

/// Parses one inbound frame.
///
/// # Errors
///
/// - [`DecodeError::Json`] if the text is not JSON
/// - [`DecodeError::NotAnObject`] if the JSON is not an object
/// - [`DecodeError::MissingType`] if `type` is absent or not a string
/// - [`DecodeError::UnknownChannel`] if `channel` is not a known topic
pub fn decode(text: &str) -> std::result::Result<Envelope, DecodeError> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(text)? else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(DecodeError::MissingType),
    };

    let channel = decode_channel(&mut fields)?;
    let data = fields.remove("data").unwrap_or(Value::Null);
    let timestamp = match fields.remove("timestamp") {
        Some(Value::String(ts)) => ts,
        _ => String::new(),
    };

    Ok(Envelope {
        kind,
        channel,
        data,
        timestamp,
    })
}

/// Extracts the optional `channel` field.
fn decode_channel(
    fields: &mut Map<String, Value>,
) -> std::result::Result<Option<Topic>, DecodeError> {
    match fields.remove("channel") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) => name.parse().map(Some),
        Some(other) => Err(DecodeError::UnknownChannel(other.to_string())),
    }
}

/// Current UTC time in the `toISOString` shape (millisecond precision, `Z`).
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_decode_application_frame() {
        let text = r#"{
            "type": "transaction_created",
            "channel": "transactions",
            "data": { "id": "tx-1", "amount": 250 },
            "timestamp": "2026-10-16T09:30:00.000Z"
        }"#;

        let envelope = decode(text).expect("decode");
        assert_eq!(envelope.kind, "transaction_created");
        assert_eq!(envelope.channel, Some(Topic::Transactions));
        assert_eq!(envelope.data["amount"], 250);
        assert_eq!(envelope.timestamp, "2026-10-16T09:30:00.000Z");
        assert!(!envelope.is_control());
    }

    #[test]
    fn test_decode_bare_pong() {
        let envelope = decode(r#"{"type":"pong"}"#).expect("decode");
        assert!(envelope.is_pong());
        assert!(envelope.is_heartbeat());
        assert_eq!(envelope.channel, None);
        assert_eq!(envelope.data, Value::Null);
        assert!(envelope.timestamp.is_empty());
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let envelope =
            decode(r#"{"type":"tick","channel":"prices","data":1,"extra":true}"#).expect("decode");
        assert_eq!(envelope.channel, Some(Topic::Prices));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode("[1,2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode(r#"{"channel":"prices"}"#), Err(DecodeError::MissingType)));
        assert!(matches!(decode(r#"{"type":7}"#), Err(DecodeError::MissingType)));
    }

    #[test]
    fn test_decode_rejects_unknown_channel() {
        let err = decode(r#"{"type":"forecast","channel":"weather"}"#).unwrap_err();
        assert!(err.is_unknown_channel());

        let err = decode(r#"{"type":"forecast","channel":3}"#).unwrap_err();
        assert!(err.is_unknown_channel());
    }

    #[test]
    fn test_control_frames_wire_shape() {
        let ping: Value = serde_json::from_str(&encode(&Envelope::ping()).expect("encode"))
            .expect("parse");
        assert_eq!(ping["type"], "ping");
        assert!(ping.get("channel").is_none());
        assert!(ping.get("data").is_none());

        let sub: Value =
            serde_json::from_str(&encode(&Envelope::subscribe(Topic::Security)).expect("encode"))
                .expect("parse");
        assert_eq!(sub["type"], "subscribe");
        assert_eq!(sub["channel"], "security");

        let unsub = Envelope::unsubscribe(Topic::Prices);
        assert!(unsub.is_control());
        assert_eq!(unsub.kind, UNSUBSCRIBE);
    }

    #[test]
    fn test_timestamp_is_iso8601_utc() {
        let envelope = Envelope::message("alert", Topic::Security, json!({}));
        assert!(envelope.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&envelope.timestamp).is_ok());
    }

    fn arb_data() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            kind in "[a-z_]{1,16}",
            channel in prop::option::of(prop::sample::select(Topic::ALL.to_vec())),
            data in arb_data(),
            timestamp in "[0-9TZ:.-]{0,24}",
        ) {
            let envelope = Envelope { kind, channel, data, timestamp };
            let text = encode(&envelope).expect("encode");
            prop_assert_eq!(decode(&text).expect("decode"), envelope);
        }
    }
}
