//! Hookwatch Common - Shared request record model
//!
//! This crate contains the wire representation of a captured webhook request
//! as it arrives on the event stream, plus the decoding and display helpers
//! shared by every consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Record decoding errors
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to decode request record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request record has an empty id")]
    MissingId,
}

/// One captured inbound request, as pushed by the capture server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Stable identifier, unique within a session
    pub id: String,

    /// HTTP method (GET, POST, etc.)
    pub method: String,

    /// Request path the webhook was delivered to
    pub endpoint: String,

    /// When the request was captured
    #[serde(with = "timestamp_serde")]
    pub timestamp: DateTime<Utc>,

    /// Header name to value, in the order the server sent them.
    /// Values are usually arrays of strings.
    #[serde(default)]
    pub headers: Map<String, Value>,

    /// Raw request body
    #[serde(default)]
    pub body: String,
}

impl RequestRecord {
    /// Decode a record from a stream payload
    pub fn from_json(s: &str) -> Result<Self, RecordError> {
        let record: RequestRecord = serde_json::from_str(s)?;
        if record.id.is_empty() {
            return Err(RecordError::MissingId);
        }
        Ok(record)
    }

    /// Encode the record the way the capture server sends it
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Short "METHOD /endpoint" summary used for list entries and notifications
    pub fn summary(&self) -> String {
        format!("{} {}", self.method, self.endpoint)
    }

    /// Headers as display pairs, in wire order
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.clone(), header_value_text(value)))
            .collect()
    }
}

/// Stringify a header value for display.
///
/// Arrays are joined with `,` (so `["a", "b"]` becomes `a,b`), strings are
/// used verbatim, `null` becomes empty and objects fall back to compact JSON.
pub fn header_value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(header_value_text)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Timestamps travel as epoch milliseconds; RFC 3339 strings are accepted too
mod timestamp_serde {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireTimestamp {
        Millis(i64),
        Text(String),
    }

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(timestamp.timestamp_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match WireTimestamp::deserialize(deserializer)? {
            WireTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
            WireTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(D::Error::custom),
        }
    }
}
