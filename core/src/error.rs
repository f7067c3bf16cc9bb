//! Error types for the Viva Payments client.
//!
//! # Design
//! Every failure is terminal for the call that produced it; nothing here is
//! retried. Non-2xx responses keep the raw status and body so callers can
//! inspect whatever error payload the provider returned.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `VivaClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not a JSON object.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The response object has no `TimeStamp` field.
    #[error("response has no TimeStamp field")]
    MissingTimestamp,

    /// `TimeStamp` was present but could not be parsed as a date-time.
    #[error("invalid TimeStamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

impl ApiError {
    /// HTTP status of a provider error response, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
