//! Best-effort conversion of stored values when a field changes type.
//!
//! A stored value is reshaped toward the target type (scalar <-> list,
//! string <-> number, csv <-> list), then run through the target processor's
//! validate and transform. Anything that still does not fit becomes the
//! target type's zero value; coercion never fails.

use serde_json::Value as JsonValue;

use crate::processors::format_number;
use crate::registry::FieldProcessorRegistry;
use crate::types::{field_types as t, FieldDef};
use crate::value::Value;

/// Result of coercing one stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Value,
    /// False when the value could not be converted and was replaced by the zero value.
    pub converted: bool,
}

#[derive(Clone, Copy)]
enum Shape {
    List,
    Scalar,
    Number,
    Boolean,
    Passthrough,
}

fn shape_of(type_: &str) -> Shape {
    match type_ {
        t::MULTISELECT | t::TAGS | t::RELATION_MANY | t::CASCADER => Shape::List,
        t::NUMBER => Shape::Number,
        t::BOOLEAN => Shape::Boolean,
        t::EXPERIENCE | t::OBJECT | t::IMAGE | t::VIDEO | t::FILE | t::LOOKUP => {
            Shape::Passthrough
        }
        _ => Shape::Scalar,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(*n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reshape a stored value toward the target type's input shape.
fn candidate(value: &Value, to: &FieldDef) -> Option<JsonValue> {
    match shape_of(&to.type_) {
        Shape::List => match value {
            Value::StringArray(v) => Some(JsonValue::from(v.clone())),
            Value::String(s) if to.type_ == t::TAGS => Some(JsonValue::String(s.clone())),
            Value::String(s) => Some(JsonValue::from(
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>(),
            )),
            other => scalar_text(other).map(|s| JsonValue::from(vec![s])),
        },
        Shape::Scalar => match value {
            Value::StringArray(v) if to.type_ == t::TEXT || to.type_ == t::TEXTAREA => {
                Some(JsonValue::String(v.join(", ")))
            }
            Value::StringArray(v) => v.first().cloned().map(JsonValue::String),
            other => scalar_text(other).map(JsonValue::String),
        },
        Shape::Number => match value {
            Value::Number(n) => Some(Value::Number(*n).to_json()),
            Value::Bool(b) => Some(JsonValue::from(u8::from(*b))),
            Value::String(s) => Some(JsonValue::String(s.clone())),
            Value::StringArray(v) if v.len() == 1 => Some(JsonValue::String(v[0].clone())),
            _ => None,
        },
        Shape::Boolean => match value {
            Value::StringArray(v) if v.len() == 1 => Some(JsonValue::String(v[0].clone())),
            Value::StringArray(_) | Value::Object(_) | Value::ObjectArray(_) => None,
            other => Some(other.to_json()),
        },
        Shape::Passthrough => Some(value.to_json()),
    }
}

/// Coerce a stored value into the type described by `to`.
pub fn coerce(registry: &FieldProcessorRegistry, value: &Value, to: &FieldDef) -> Coerced {
    if value.is_null() {
        return Coerced {
            value: Value::Null,
            converted: true,
        };
    }

    let mut relaxed = to.clone();
    relaxed.required = false;

    if let Some(json) = candidate(value, to) {
        if registry.validate(&relaxed, Some(&json)).is_ok() {
            let out = registry.transform(&relaxed, &json);
            if !(to.required && out.is_empty()) {
                return Coerced {
                    value: out,
                    converted: true,
                };
            }
        }
    }

    Coerced {
        value: registry.zero_value(&to.type_),
        converted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectOption;

    fn reg() -> FieldProcessorRegistry {
        FieldProcessorRegistry::builtin()
    }

    fn choices(type_: &str) -> FieldDef {
        FieldDef::new("status", type_)
            .with_options(vec![SelectOption::new("a"), SelectOption::new("b")])
    }

    #[test]
    fn select_to_multiselect_wraps() {
        let out = coerce(&reg(), &Value::from("a"), &choices(t::MULTISELECT));
        assert_eq!(out.value, Value::StringArray(vec!["a".into()]));
        assert!(out.converted);
    }

    #[test]
    fn multiselect_to_select_takes_first() {
        let v = Value::StringArray(vec!["b".into(), "a".into()]);
        assert_eq!(coerce(&reg(), &v, &choices(t::SELECT)).value, Value::from("b"));
    }

    #[test]
    fn select_to_multiselect_outside_options_zeroes() {
        let out = coerce(&reg(), &Value::from("z"), &choices(t::MULTISELECT));
        assert_eq!(out.value, Value::StringArray(vec![]));
        assert!(!out.converted);
    }

    #[test]
    fn string_number_round() {
        let number = FieldDef::new("n", t::NUMBER);
        assert_eq!(coerce(&reg(), &Value::from("42"), &number).value, Value::Number(42.0));
        let out = coerce(&reg(), &Value::from("forty"), &number);
        assert_eq!(out.value, Value::Number(0.0));
        assert!(!out.converted);

        let text = FieldDef::new("n", t::TEXT);
        assert_eq!(coerce(&reg(), &Value::Number(42.0), &text).value, Value::from("42"));
    }

    #[test]
    fn csv_and_lists() {
        let tags = FieldDef::new("t", t::TAGS);
        assert_eq!(
            coerce(&reg(), &Value::from("a, b"), &tags).value,
            Value::StringArray(vec!["a".into(), "b".into()])
        );
        let text = FieldDef::new("t", t::TEXT);
        assert_eq!(
            coerce(&reg(), &Value::StringArray(vec!["a".into(), "b".into()]), &text).value,
            Value::from("a, b")
        );
    }

    #[test]
    fn objects_do_not_become_numbers() {
        let number = FieldDef::new("n", t::NUMBER);
        let obj = Value::from(serde_json::json!({"a": 1}));
        assert_eq!(coerce(&reg(), &obj, &number).value, Value::Number(0.0));
    }
}
