//! Parsing of the provider's `TimeStamp` field.
//!
//! The API reports times like `2013-10-01T15:11:41.4391667+03:00`: up to seven
//! fractional digits and a colon-separated offset. Before parsing, the
//! fraction is truncated (not rounded) to microseconds and the offset colon is
//! dropped. Strings that do not have that shape are parsed unchanged, and
//! must then carry a `.` with one to six fractional digits right before the
//! offset.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::error::ApiError;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

static FRACTION_AND_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.([0-9]{6})[0-9]*([-+][0-9]{2}):([0-9]{2})$").expect("static pattern compiles")
});

static PARSEABLE_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.[0-9]{1,6}[-+][0-9]{2}:?[0-9]{2}$").expect("static pattern compiles")
});

/// Truncates the fraction to six digits and rewrites `+HH:MM` as `+HHMM`.
pub fn normalize(raw: &str) -> Cow<'_, str> {
    FRACTION_AND_OFFSET.replace(raw, ".${1}${2}${3}")
}

/// Normalizes and parses a provider timestamp.
pub fn parse(raw: &str) -> Result<DateTime<FixedOffset>, ApiError> {
    let normalized = normalize(raw);
    if !PARSEABLE_TAIL.is_match(&normalized) {
        return Err(ApiError::InvalidTimestamp {
            value: raw.to_string(),
            reason: "expected a fraction of one to six digits followed by a UTC offset".to_string(),
        });
    }
    DateTime::parse_from_str(&normalized, FORMAT).map_err(|e| ApiError::InvalidTimestamp {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
