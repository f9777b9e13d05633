//! # Stream Events
//!
//! Event types emitted by the backend agents while an article is generated.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity of the backend agent that produced an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentId {
    /// Orchestrator bookkeeping, never moves the stage
    Tracker,
    Researcher,
    Strategist,
    Writer,
    Artist,
    /// Any name this client does not know, kept verbatim
    Unknown(String),
}

impl AgentId {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tracker => "tracker",
            Self::Researcher => "researcher",
            Self::Strategist => "strategist",
            Self::Writer => "writer",
            Self::Artist => "artist",
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for AgentId {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tracker" => Self::Tracker,
            "researcher" => Self::Researcher,
            "strategist" => Self::Strategist,
            "writer" => Self::Writer,
            "artist" => Self::Artist,
            _ => Self::Unknown(name),
        }
    }
}

impl From<&str> for AgentId {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<AgentId> for String {
    fn from(agent: AgentId) -> Self {
        agent.as_str().to_string()
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of stream event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Plain progress line
    #[default]
    Log,
    /// Structured card (outline, keyword table, image...)
    Card,
    /// Something went wrong
    Error,
    /// A kind added on the backend after this client was built
    #[serde(other)]
    Other,
}

/// When an event happened
///
/// Backends send epoch milliseconds or an ISO 8601 string. Decoding through
/// [`Timestamp::from_value`] also takes fractional millis and naive datetimes
/// (read as UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Iso(DateTime<Utc>),
}

impl Timestamp {
    pub fn now() -> Self {
        Self::Iso(Utc::now())
    }

    /// Read any timestamp shape seen on the wire
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
                .map(Self::Millis),
            Value::String(s) => Self::parse_iso(s.trim()),
            _ => None,
        }
    }

    fn parse_iso(text: &str) -> Option<Self> {
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::Iso(at.with_timezone(&Utc)));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| Self::Iso(Utc.from_utc_datetime(&naive)))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Iso(at) => Some(*at),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

/// One entry of the session's event log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    /// Unique event ID
    #[serde(default = "new_event_id")]
    pub id: String,
    /// Agent that produced this event
    #[serde(default)]
    pub agent_id: AgentId,
    /// Kind of event
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: EventKind,
    /// Card flavour when `kind` is `card`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Associated data (JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Timestamp,
}

/// Timestamps are cosmetic; an unreadable one must not cost the event
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Timestamp::from_value(&value).unwrap_or_else(|| {
        if !value.is_null() {
            tracing::debug!(%value, "Unreadable event timestamp, using receive time");
        }
        Timestamp::now()
    }))
}

impl StreamEvent {
    /// Create a new event
    pub fn new(kind: EventKind, agent_id: AgentId) -> Self {
        Self {
            id: new_event_id(),
            agent_id,
            kind,
            card_type: None,
            message: None,
            data: None,
            timestamp: Timestamp::now(),
        }
    }

    /// A log line attributed to `agent_id`
    pub fn log(agent_id: AgentId, message: impl Into<String>) -> Self {
        Self::new(EventKind::Log, agent_id).with_message(message)
    }

    /// An error entry, used for backend and transport failures alike
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, AgentId::Tracker).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_card_type(mut self, card_type: impl Into<String>) -> Self {
        self.kind = EventKind::Card;
        self.card_type = Some(card_type.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }
}

fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
