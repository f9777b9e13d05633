//! # Envelopes
//!
//! The wire unit of the protocol: `{"type": "event" | "done" | "error", "data": ...}`.

use super::events::StreamEvent;
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator of a raw envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    Event,
    Done,
    Error,
}

/// An envelope as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    #[serde(default)]
    pub data: Value,
}

/// Shapes a terminal `done` payload can take
///
/// Anything that is neither text nor a record is kept only so it can be
/// logged; the normalizer never tries to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalPayload {
    Text(String),
    Record(Map<String, Value>),
    Unrecognized(Value),
}

impl From<Value> for TerminalPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(record) => Self::Record(record),
            other => Self::Unrecognized(other),
        }
    }
}

/// A decoded envelope, ready to dispatch
#[derive(Debug, Clone)]
pub enum Envelope {
    Event(StreamEvent),
    Done(TerminalPayload),
    Error { message: String },
}

impl Envelope {
    /// Decode one frame payload
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let raw: RawEnvelope = serde_json::from_str(frame)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawEnvelope) -> Result<Self, ProtocolError> {
        match raw.kind {
            EnvelopeType::Event => serde_json::from_value(raw.data)
                .map(Envelope::Event)
                .map_err(ProtocolError::Event),
            EnvelopeType::Done => Ok(Envelope::Done(raw.data.into())),
            EnvelopeType::Error => Ok(Envelope::Error {
                message: error_message(&raw.data),
            }),
        }
    }
}

/// Pull a human-readable message out of an `error` payload
fn error_message(data: &Value) -> String {
    if let Some(message) = data.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(message) = data.as_str() {
        return message.to_string();
    }
    "The generation service reported an error".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::events::AgentId;

    #[test]
    fn test_decode_event_envelope() {
        let envelope =
            Envelope::decode(r#"{"type":"event","data":{"agentId":"researcher","type":"log","message":"Searching"}}"#)
                .unwrap();

        match envelope {
            Envelope::Event(event) => {
                assert_eq!(event.agent_id, AgentId::Researcher);
                assert_eq!(event.message.as_deref(), Some("Searching"));
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_done_keeps_payload_shape() {
        let text = Envelope::decode(r#"{"type":"done","data":"{\"content\":\"x\"}"}"#).unwrap();
        assert!(matches!(text, Envelope::Done(TerminalPayload::Text(_))));

        let record = Envelope::decode(r#"{"type":"done","data":{"content":"x"}}"#).unwrap();
        assert!(matches!(record, Envelope::Done(TerminalPayload::Record(_))));

        let other = Envelope::decode(r#"{"type":"done","data":[1,2]}"#).unwrap();
        assert!(matches!(other, Envelope::Done(TerminalPayload::Unrecognized(_))));
    }

    #[test]
    fn test_decode_error_message_shapes() {
        let object = Envelope::decode(r#"{"type":"error","data":{"message":"rate limited"}}"#);
        assert!(matches!(object, Ok(Envelope::Error { message }) if message == "rate limited"));

        let bare = Envelope::decode(r#"{"type":"error","data":"boom"}"#);
        assert!(matches!(bare, Ok(Envelope::Error { message }) if message == "boom"));

        let empty = Envelope::decode(r#"{"type":"error"}"#);
        assert!(matches!(empty, Ok(Envelope::Error { .. })));
    }

    #[test]
    fn test_malformed_frames_are_protocol_errors() {
        assert!(matches!(Envelope::decode("{not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            Envelope::decode(r#"{"type":"heartbeat","data":{}}"#),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            Envelope::decode(r#"{"type":"event","data":"not an event"}"#),
            Err(ProtocolError::Event(_))
        ));
    }
}
