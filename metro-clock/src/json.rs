//! Lenient readers for upstream JSON.
//!
//! Upstream feeds disagree with their own documentation often enough that
//! numeric fields arrive as strings and lists arrive as `null`. These helpers
//! turn such values into something usable or into `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a list that may be missing or `null`.
pub fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read an integer from a number or a numeric string.
///
/// Fractional numbers truncate toward zero; anything else is `None`.
pub fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render an identifier that may be a string or a number.
///
/// Missing and `null` ids become the empty string.
pub fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
