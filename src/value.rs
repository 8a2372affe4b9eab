//! Coercion of loosely-typed template arguments to text.
//!
//! Template functions receive whatever the template passes. Each accessor
//! runs its argument through [`to_text`] once, at entry.

use serde_json::Value;
use thiserror::Error;

/// Argument could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to cast {type_name} to string")]
pub struct CoerceError {
    /// JSON type of the rejected value.
    pub type_name: &'static str,
}

/// Coerce a template argument to text.
///
/// | input          | output                       |
/// |----------------|------------------------------|
/// | string         | verbatim                     |
/// | bool           | `"true"` / `"false"`         |
/// | integer        | decimal                      |
/// | float          | shortest decimal, no exponent |
/// | null           | `""`                         |
/// | array / object | [`CoerceError`]              |
pub fn to_text(value: &Value) -> Result<String, CoerceError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => f.to_string(),
            (None, None, None) => n.to_string(),
        }),
        Value::Array(_) => Err(CoerceError { type_name: "array" }),
        Value::Object(_) => Err(CoerceError { type_name: "object" }),
    }
}
