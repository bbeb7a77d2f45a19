use serde_json::{Number, Value};

use crate::IdKey;

/// Identity of a JSON record, as read by [`IdKey::json_field`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JsonKey {
    String(String),
    /// Numbers compare by value: `1` and `1.0` are the same key.
    Number(String),
    True,
    /// Arrays and objects compare structurally, by their serialized form.
    Compound(String),
}

impl JsonKey {
    /// Reads `value` as an identity, or `None` for falsy values (`null`, `false`, `0`, `""`).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Bool(false) => None,
            Value::Bool(true) => Some(Self::True),
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) if n.as_f64().is_some_and(|v| v == 0.0) => None,
            Value::Number(n) => Some(Self::Number(canonical_number(n))),
            Value::Array(_) | Value::Object(_) => Some(Self::Compound(value.to_string())),
        }
    }
}

// Integral values print as integers so `1`, `1.0` and `1e0` agree.
fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(v) if v.fract() == 0.0 && v.abs() < MAX_SAFE_INTEGER => (v as i64).to_string(),
        Some(v) => v.to_string(),
        None => n.to_string(),
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl IdKey<Value, JsonKey> {
    /// Identity read from a named field of JSON object records.
    ///
    /// A record that is not an object, or lacks the field, counts as missing the identity field;
    /// a present but falsy value counts as an empty id.
    pub fn json_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let present = field.clone();
        Self::with_presence(
            move |record: &Value| record.get(present.as_str()).is_some(),
            move |record: &Value| record.get(field.as_str()).and_then(JsonKey::from_value),
        )
    }
}
