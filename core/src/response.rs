//! Decoded API responses.
//!
//! # Design
//! The provider's response schema is not modelled. A response is the decoded
//! JSON object with `TimeStamp` lifted out into a typed date-time; every other
//! field is kept exactly as decoded, nested values included.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::timestamp;

pub const TIMESTAMP_FIELD: &str = "TimeStamp";

/// A decoded response object with a structured `TimeStamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    timestamp: DateTime<FixedOffset>,
    fields: Map<String, Value>,
}

impl ApiResponse {
    /// Decodes a response body. Fails when the body is not a JSON object or
    /// when `TimeStamp` is absent or unparseable.
    pub fn decode(body: &str) -> Result<Self, ApiError> {
        let mut fields: Map<String, Value> =
            serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;

        let raw = fields.remove(TIMESTAMP_FIELD).ok_or(ApiError::MissingTimestamp)?;
        let timestamp = match &raw {
            Value::String(s) => timestamp::parse(s)?,
            other => {
                return Err(ApiError::InvalidTimestamp {
                    value: other.to_string(),
                    reason: "expected a string".to_string(),
                })
            }
        };

        Ok(Self { timestamp, fields })
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Any field other than `TimeStamp`, as decoded.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields other than `TimeStamp`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// `OrderCode` rendered as text, whether the provider sent it as a
    /// number or a string.
    pub fn order_code(&self) -> Option<String> {
        match self.fields.get("OrderCode")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// `ErrorCode` as reported by the provider; `0` means success.
    pub fn error_code(&self) -> Option<i64> {
        self.fields.get("ErrorCode").and_then(Value::as_i64)
    }

    /// The whole response as JSON, with `TimeStamp` rendered as RFC 3339.
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(TIMESTAMP_FIELD.to_string(), Value::String(self.timestamp_rfc3339()));
        Value::Object(map)
    }

    fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

impl Serialize for ApiResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(TIMESTAMP_FIELD, &self.timestamp_rfc3339())?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
