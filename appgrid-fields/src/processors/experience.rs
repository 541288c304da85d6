//! Composite processors: `experience` entries and schema-described objects.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::{is_blank, FieldProcessor};
use crate::error::FieldError;
use crate::types::FieldDef;
use crate::value::{Object, Value};

/// Keys every experience entry must carry as non-empty strings.
pub const EXPERIENCE_REQUIRED: [&str; 5] = ["id", "type", "title", "organization", "startDate"];

fn non_empty_str(item: &Map<String, JsonValue>, key: &str) -> bool {
    item.get(key)
        .and_then(JsonValue::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

/// JS-style falsiness, used to prune optional subfields.
fn is_falsy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => false,
    }
}

/// Trim strings and drop falsy entries, recursing one level into arrays.
fn prune(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| JsonValue::String(t.to_string()))
        }
        JsonValue::Array(items) => {
            let kept: Vec<JsonValue> = items
                .iter()
                .filter(|v| !is_falsy(v))
                .filter_map(prune)
                .collect();
            (!kept.is_empty()).then_some(JsonValue::Array(kept))
        }
        other if is_falsy(other) => None,
        other => Some(other.clone()),
    }
}

fn clean_entry(item: &Map<String, JsonValue>) -> Object {
    item.iter()
        .filter_map(|(k, v)| prune(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Career entries: work, education (`degree`, `department`) and
/// certifications (`issuer`). Optional subfields such as `description`,
/// `location`, `skills` and `achievements` are trimmed and empty entries pruned.
pub struct ExperienceProcessor;

impl FieldProcessor for ExperienceProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        let items = value
            .as_array()
            .ok_or_else(|| FieldError::new("must be a list of entries"))?;

        let mut errors = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            let Some(obj) = item.as_object() else {
                errors.insert(idx, "must be an object".to_string());
                continue;
            };
            let missing: Vec<&str> = EXPERIENCE_REQUIRED
                .iter()
                .copied()
                .filter(|key| !non_empty_str(obj, key))
                .collect();
            if !missing.is_empty() {
                errors.insert(idx, format!("missing {}", missing.join(", ")));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldError::from_items(errors))
        }
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        let entries = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(JsonValue::as_object)
                    .map(clean_entry)
                    .collect()
            })
            .unwrap_or_default();
        Value::ObjectArray(entries)
    }

    fn format(&self, value: &Value, _field: &FieldDef) -> String {
        let Some(entries) = value.as_object_array() else {
            return String::new();
        };
        entries
            .iter()
            .map(|e| {
                let get = |k: &str| e.get(k).and_then(JsonValue::as_str).unwrap_or("");
                let end = match get("endDate") {
                    "" => "present",
                    end => end,
                };
                format!(
                    "{} at {} ({} - {})",
                    get("title"),
                    get("organization"),
                    get("startDate"),
                    end
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn zero_value(&self) -> Value {
        Value::ObjectArray(Vec::new())
    }
}

/// A single JSON object. `schema.required` lists keys that must be present.
pub struct ObjectProcessor;

impl ObjectProcessor {
    fn required_keys(field: &FieldDef) -> Vec<&str> {
        field
            .schema
            .as_ref()
            .and_then(|s| s.get("required"))
            .and_then(JsonValue::as_array)
            .map(|keys| keys.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }
}

impl FieldProcessor for ObjectProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let obj = value
            .as_object()
            .ok_or_else(|| FieldError::new("must be an object"))?;
        let missing: Vec<&str> = Self::required_keys(field)
            .into_iter()
            .filter(|k| obj.get(*k).is_none_or(is_blank))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FieldError::new(format!("missing {}", missing.join(", "))))
        }
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        value
            .as_object()
            .map(|o| Value::Object(o.clone()))
            .unwrap_or_default()
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        match &field.schema {
            Some(schema) if !schema.is_object() => Err("schema must be an object".into()),
            _ => Ok(()),
        }
    }
}
