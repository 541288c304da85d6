//! The stored value model for record properties.
//!
//! Records are a schema-less bag of `key -> Value`. `Value` keeps the JSON
//! shapes the field processors produce (scalars, string lists, objects and
//! lists of objects) while staying inspectable from Rust.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// JSON object as stored inside composite values.
pub type Object = Map<String, JsonValue>;

/// A normalized property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    StringArray(Vec<String>),
    Object(Object),
    ObjectArray(Vec<Object>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for null, blank strings and empty collections.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::StringArray(v) => v.is_empty(),
            Value::Object(o) => o.is_empty(),
            Value::ObjectArray(v) => v.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Value::StringArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_array(&self) -> Option<&[Object]> {
        match self {
            Value::ObjectArray(v) => Some(v),
            _ => None,
        }
    }

    /// Collect the string ids held by a scalar or list value.
    ///
    /// Used for relation values, which are stored as one id or a list of ids.
    pub fn ids(&self) -> Vec<String> {
        match self {
            Value::String(s) if !s.is_empty() => vec![s.clone()],
            Value::StringArray(v) => v.clone(),
            _ => Vec::new(),
        }
    }

    /// Plain JSON form. Integral numbers are emitted as JSON integers.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::StringArray(v) => {
                JsonValue::Array(v.iter().cloned().map(JsonValue::String).collect())
            }
            Value::Object(o) => JsonValue::Object(o.clone()),
            Value::ObjectArray(v) => {
                JsonValue::Array(v.iter().cloned().map(JsonValue::Object).collect())
            }
        }
    }
}

fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

/// Lossy conversion from arbitrary JSON.
///
/// Arrays made only of objects become `ObjectArray`; any other array becomes
/// a `StringArray` where numbers and booleans are stringified, nested
/// structures are rendered as JSON text and nulls are dropped.
impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Object(o) => Value::Object(o),
            JsonValue::Array(items) => {
                if !items.is_empty() && items.iter().all(JsonValue::is_object) {
                    Value::ObjectArray(
                        items
                            .into_iter()
                            .filter_map(|item| match item {
                                JsonValue::Object(o) => Some(o),
                                _ => None,
                            })
                            .collect(),
                    )
                } else {
                    Value::StringArray(items.into_iter().filter_map(scalar_to_string).collect())
                }
            }
        }
    }
}

fn scalar_to_string(json: JsonValue) -> Option<String> {
    match json {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringArray(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_convert() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!(true)), Value::Bool(true));
        assert_eq!(Value::from(json!(3)), Value::Number(3.0));
        assert_eq!(Value::from(json!("a")), Value::String("a".into()));
    }

    #[test]
    fn arrays_pick_a_shape() {
        assert_eq!(
            Value::from(json!(["a", "b"])),
            Value::StringArray(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            Value::from(json!(["a", null, 2])),
            Value::StringArray(vec!["a".into(), "2".into()])
        );
        let objs = Value::from(json!([{"id": "1"}, {"id": "2"}]));
        assert_eq!(objs.as_object_array().map(|v| v.len()), Some(2));
        assert_eq!(Value::from(json!([])), Value::StringArray(vec![]));
    }

    #[test]
    fn integral_numbers_serialize_as_integers() {
        let json = serde_json::to_string(&Value::Number(42.0)).unwrap();
        assert_eq!(json, "42");
        let json = serde_json::to_string(&Value::Number(1.5)).unwrap();
        assert_eq!(json, "1.5");
    }

    #[test]
    fn emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::String("  ".into()).is_empty());
        assert!(Value::StringArray(vec![]).is_empty());
        assert!(!Value::Number(0.0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn ids_from_relation_values() {
        assert_eq!(Value::from("a").ids(), vec!["a".to_string()]);
        assert_eq!(
            Value::from(vec!["b".to_string(), "a".to_string()]).ids(),
            vec!["b".to_string(), "a".to_string()]
        );
        assert!(Value::Null.ids().is_empty());
    }
}
