//! Free-form tag lists.

use serde_json::Value as JsonValue;

use super::{dedup, FieldProcessor};
use crate::error::FieldError;
use crate::types::FieldDef;
use crate::value::Value;

/// Split, trim and dedup tag input. Strings are comma-separated lists.
pub(crate) fn normalize_tags(value: &JsonValue) -> Vec<String> {
    let raw: Vec<String> = match value {
        JsonValue::String(s) => s.split(',').map(str::to_string).collect(),
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    dedup(
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

/// An array of strings; a comma-separated string is split on transform.
pub struct TagsProcessor;

impl FieldProcessor for TagsProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        match value {
            JsonValue::String(_) => {}
            JsonValue::Array(items) => {
                if let Some(idx) = items
                    .iter()
                    .position(|item| !(item.is_string() || item.is_null()))
                {
                    return Err(FieldError::new(format!("tag {idx} must be a string")));
                }
            }
            _ => return Err(FieldError::new("must be a list of tags")),
        }
        if let Some(max) = field.validators.max_length {
            if normalize_tags(value).len() > max {
                return Err(FieldError::new(format!("at most {max} tags allowed")));
            }
        }
        Ok(())
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        Value::StringArray(normalize_tags(value))
    }

    fn zero_value(&self) -> Value {
        Value::StringArray(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comma_separated_strings_split() {
        let field = FieldDef::new("tags", "tags");
        assert_eq!(
            TagsProcessor.transform(&json!(" rust, db ,,rust "), &field),
            Value::StringArray(vec!["rust".into(), "db".into()])
        );
    }

    #[test]
    fn arrays_trimmed() {
        let field = FieldDef::new("tags", "tags");
        assert!(TagsProcessor.validate(&json!(["a", null]), &field).is_ok());
        assert!(TagsProcessor.validate(&json!(["a", 3]), &field).is_err());
        assert!(TagsProcessor.validate(&json!(5), &field).is_err());
        assert_eq!(
            TagsProcessor.transform(&json!([" a ", "", null, "b"]), &field),
            Value::StringArray(vec!["a".into(), "b".into()])
        );
    }
}
