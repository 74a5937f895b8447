//! Forgiving coercions for hand-edited JSON: numbers may arrive as strings, flags as
//! numbers, literals as either.

use scene::components::{PropertyValue, format_number, parse_leading_f64};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Full-string numeric coercion used for map definitions.
///
/// Numbers pass through, strings are trimmed and parsed whole (blank reads as 0).
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                Some(0.0)
            } else {
                t.parse().ok()
            }
        }
        _ => None,
    }
}

/// Prefix numeric coercion used for style parameters (`"12px"` reads as 12).
pub fn style_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_f64(s),
        _ => None,
    }
}

pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Converts a record field into a property value; `null` has no property form.
pub fn property_value(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(PropertyValue::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(PropertyValue::Number),
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        other => Some(PropertyValue::Structured(other.to_string())),
    }
}

pub fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(style_f64))
}

pub fn de_opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(text))
}

pub fn de_truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().is_some_and(truthy))
}
