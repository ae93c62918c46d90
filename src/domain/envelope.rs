//! Message envelopes exchanged over a connection.
//!
//! Outbound traffic uses the strict [`Envelope`] shape:
//!
//! ```json
//! { "type": 0, "body": { "action": "ping", "body": "hello" } }
//! ```
//!
//! Inbound traffic is decoded loosely into an [`InboundMessage`] (a plain
//! JSON object) and only the keys the read loop cares about are looked up.
//! The two schemas are kept apart on purpose: a client may send any object
//! that carries an `action`, while peers always receive a full envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HubError;

/// Action of the notification sent to every member when a client joins.
pub const LOGIN_ACTION: &str = "Login of User";

/// Action of the notification sent to remaining members when a client leaves.
pub const LOGOUT_ACTION: &str = "Logout of User";

/// Control action answered directly by the receiving client.
pub const PING_ACTION: &str = "ping";

/// Inner record of an [`Envelope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseMessage {
    /// Free-form command name, e.g. `"ping"`.
    pub action: String,
    /// String payload.
    pub body: String,
}

/// Outbound wire envelope.
///
/// Immutable once built; the pool encodes it once and hands the same text
/// to every member during fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Numeric type tag. Every envelope the hub produces uses `0`.
    #[serde(rename = "type")]
    pub kind: i64,
    /// Action and payload.
    pub body: BaseMessage,
}

impl Envelope {
    /// Builds a type-0 envelope with the given action and body.
    #[must_use]
    pub fn new(action: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: 0,
            body: BaseMessage {
                action: action.into(),
                body: body.into(),
            },
        }
    }

    /// Synthetic join notification.
    #[must_use]
    pub fn login() -> Self {
        Self::new(LOGIN_ACTION, "")
    }

    /// Synthetic leave notification.
    #[must_use]
    pub fn logout() -> Self {
        Self::new(LOGOUT_ACTION, "")
    }

    /// Direct answer to a ping, echoing the request body verbatim.
    #[must_use]
    pub fn ping_reply(body: impl Into<String>) -> Self {
        Self::new(PING_ACTION, body)
    }

    /// Encodes the envelope as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialize`] if encoding fails.
    pub fn encode(&self) -> Result<String, HubError> {
        serde_json::to_string(self).map_err(|e| HubError::Serialize(e.to_string()))
    }
}

/// What the read loop should do with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Answer the sender directly after the configured delay.
    Ping {
        /// Body to echo back.
        body: String,
    },
    /// Hand a message to the pool for fan-out.
    Forward {
        /// The inbound `action`, when it was a string.
        action: Option<String>,
        /// The inbound `body`, when it was a string.
        body: Option<String>,
    },
}

/// Loosely decoded inbound message: any JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage(Map<String, Value>);

impl InboundMessage {
    /// Decodes a raw payload.
    ///
    /// Only a JSON object is accepted. A bare `null` is rejected too, even
    /// though a lenient map decoder would read it as an empty message and
    /// forward it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Decode`] when the payload is not a JSON object.
    pub fn parse(payload: &[u8]) -> Result<Self, HubError> {
        Ok(Self(serde_json::from_slice(payload)?))
    }

    /// The `action` key, if present and a string.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    /// The `body` key, if present and a string.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.0.get("body").and_then(Value::as_str)
    }

    /// Decides how the message is routed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidField`] for a ping whose `body` is missing
    /// or not a string.
    pub fn classify(&self) -> Result<Classified, HubError> {
        if self.action() == Some(PING_ACTION) {
            let body = self.body().ok_or(HubError::InvalidField("body"))?;
            return Ok(Classified::Ping {
                body: body.to_string(),
            });
        }
        Ok(Classified::Forward {
            action: self.action().map(ToString::to_string),
            body: self.body().map(ToString::to_string),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn encode(env: &Envelope) -> String {
        let Ok(text) = env.encode() else {
            panic!("encode failed");
        };
        text
    }

    fn parse(raw: &str) -> InboundMessage {
        let Ok(msg) = InboundMessage::parse(raw.as_bytes()) else {
            panic!("parse failed for {raw}");
        };
        msg
    }

    #[test]
    fn synthetic_notifications_wire_shape() {
        assert_eq!(
            encode(&Envelope::login()),
            r#"{"type":0,"body":{"action":"Login of User","body":""}}"#
        );
        assert_eq!(
            encode(&Envelope::logout()),
            r#"{"type":0,"body":{"action":"Logout of User","body":""}}"#
        );
        assert_eq!(
            encode(&Envelope::ping_reply("hello")),
            r#"{"type":0,"body":{"action":"ping","body":"hello"}}"#
        );
        assert_eq!(
            encode(&Envelope::default()),
            r#"{"type":0,"body":{"action":"","body":""}}"#
        );
    }

    #[test]
    fn ping_is_classified_with_body() {
        let msg = parse(r#"{"action":"ping","body":"hello","extra":1}"#);
        assert_eq!(
            msg.classify().ok(),
            Some(Classified::Ping {
                body: "hello".to_string()
            })
        );
    }

    #[test]
    fn ping_with_non_string_body_is_a_fault() {
        let msg = parse(r#"{"action":"ping","body":42}"#);
        assert!(matches!(
            msg.classify(),
            Err(HubError::InvalidField("body"))
        ));
    }

    #[test]
    fn ping_without_body_is_a_fault() {
        let msg = parse(r#"{"action":"ping"}"#);
        assert!(msg.classify().is_err());
    }

    #[test]
    fn other_actions_are_forwarded() {
        let msg = parse(r#"{"action":"foo","body":"bar"}"#);
        assert_eq!(
            msg.classify().ok(),
            Some(Classified::Forward {
                action: Some("foo".to_string()),
                body: Some("bar".to_string()),
            })
        );
    }

    #[test]
    fn missing_or_non_string_action_is_forwarded() {
        for raw in [r#"{}"#, r#"{"action":7,"body":"x"}"#] {
            let Ok(classified) = parse(raw).classify() else {
                panic!("classify failed for {raw}");
            };
            assert!(matches!(classified, Classified::Forward { action: None, .. }));
        }
    }

    #[test]
    fn non_object_payloads_fail_to_decode() {
        for raw in ["{oops", "[1,2]", "\"ping\"", "null", ""] {
            assert!(
                matches!(InboundMessage::parse(raw.as_bytes()), Err(HubError::Decode(_))),
                "expected decode failure for {raw:?}"
            );
        }
    }
}
