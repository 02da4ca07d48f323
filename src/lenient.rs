//! Tolerant field decoding for API payloads.
//!
//! The backend passes through whatever its upstream data source returns, so
//! numbers arrive as JSON numbers, numeric strings, `null`, or not at all.
//! These helpers never fail on a malformed value; they fall back to `0` or
//! `"N/A"` instead.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

/// Parses a float the way the dashboard expects: surrounding whitespace is
/// ignored and anything unparseable or non-finite becomes `0.0`.
pub fn parse_f64(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Numeric view of an arbitrary JSON value.
pub fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_f64(s),
        _ => 0.0,
    }
}

/// Display view of an arbitrary JSON value.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

pub fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}

pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

/// Strings that may be sent as numbers (`"id": 120010`) or `null`.
pub fn display<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_display(&value))
}
