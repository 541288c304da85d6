//! Processors for values that point elsewhere: relations and media references.

use serde_json::Value as JsonValue;

use super::{dedup, string_list, FieldProcessor};
use crate::error::FieldError;
use crate::types::{field_types, FieldDef, RelationMode};
use crate::value::Value;

/// Record ids in another directory. Only the shape is checked here;
/// existence is checked by the engine's relation resolver.
pub struct RelationProcessor {
    mode: RelationMode,
}

impl RelationProcessor {
    pub fn one() -> Self {
        Self {
            mode: RelationMode::One,
        }
    }

    pub fn many() -> Self {
        Self {
            mode: RelationMode::Many,
        }
    }
}

impl FieldProcessor for RelationProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        match self.mode {
            RelationMode::One => match value.as_str() {
                Some(id) if !id.trim().is_empty() => Ok(()),
                _ => Err(FieldError::new("must be a record id")),
            },
            RelationMode::Many => {
                let ids =
                    string_list(value).ok_or_else(|| FieldError::new("must be a list of record ids"))?;
                if ids.iter().any(|id| id.trim().is_empty()) {
                    return Err(FieldError::new("record ids cannot be empty"));
                }
                Ok(())
            }
        }
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        match self.mode {
            RelationMode::One => value
                .as_str()
                .map(|id| Value::String(id.trim().to_string()))
                .unwrap_or_default(),
            RelationMode::Many => Value::StringArray(dedup(
                string_list(value)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|id| id.trim().to_string())
                    .collect(),
            )),
        }
    }

    fn zero_value(&self) -> Value {
        match self.mode {
            RelationMode::One => Value::Null,
            RelationMode::Many => Value::StringArray(Vec::new()),
        }
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        let rel = field
            .relation
            .as_ref()
            .ok_or("relation fields need a relation target")?;
        if rel.target_directory_id.trim().is_empty() {
            return Err("relation target directory is empty".into());
        }
        if rel.mode != self.mode {
            return Err(format!(
                "relation mode {:?} does not match type '{}'",
                rel.mode, field.type_
            ));
        }
        Ok(())
    }
}

/// Is this an acceptable media reference: absolute URL, data URI or rooted path?
fn is_reference(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }
    s.starts_with("data:") || s.starts_with('/') || url::Url::parse(s).is_ok()
}

/// Image, video and file references. Content is never inspected.
pub struct MediaProcessor;

impl FieldProcessor for MediaProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        let refs = string_list(value)
            .ok_or_else(|| FieldError::new("must be a reference or a list of references"))?;
        match refs.iter().position(|r| !is_reference(r)) {
            Some(idx) => Err(FieldError::new(format!(
                "reference {idx} must be a URL or data URI"
            ))),
            None => Ok(()),
        }
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        match value {
            JsonValue::String(s) => Value::String(s.trim().to_string()),
            other => Value::StringArray(
                string_list(other)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|r| r.trim().to_string())
                    .collect(),
            ),
        }
    }

    fn format(&self, value: &Value, field: &FieldDef) -> String {
        let noun = match field.type_.as_str() {
            field_types::IMAGE => "image",
            field_types::VIDEO => "video",
            _ => "file",
        };
        match value {
            Value::String(s) if s.starts_with("data:") => format!("1 {noun}"),
            Value::String(s) => s.clone(),
            Value::StringArray(v) if v.len() == 1 => format!("1 {noun}"),
            Value::StringArray(v) => format!("{} {noun}s", v.len()),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field_types::{RELATION_MANY, RELATION_ONE};
    use serde_json::json;

    #[test]
    fn relation_one_shape() {
        let field = FieldDef::new("owner", RELATION_ONE).with_relation("people");
        let p = RelationProcessor::one();
        assert!(p.validate(&json!("01H"), &field).is_ok());
        assert!(p.validate(&json!(["01H"]), &field).is_err());
        assert!(p.check_definition(&field).is_ok());
    }

    #[test]
    fn relation_many_keeps_order() {
        let field = FieldDef::new("members", RELATION_MANY).with_relation("people");
        let p = RelationProcessor::many();
        assert_eq!(
            p.transform(&json!(["b", "a", "c", "a"]), &field),
            Value::StringArray(vec!["b".into(), "a".into(), "c".into()])
        );
        assert!(p.validate(&json!(["a", ""]), &field).is_err());
    }

    #[test]
    fn relation_needs_target() {
        let field = FieldDef::new("owner", RELATION_ONE);
        assert!(RelationProcessor::one().check_definition(&field).is_err());
        let mismatched = FieldDef::new("owner", RELATION_MANY).with_relation("people");
        assert!(RelationProcessor::one().check_definition(&mismatched).is_err());
    }

    #[test]
    fn media_references() {
        let field = FieldDef::new("photo", "image");
        assert!(MediaProcessor
            .validate(&json!("https://cdn.example.com/a.png"), &field)
            .is_ok());
        assert!(MediaProcessor
            .validate(&json!(["data:image/png;base64,AAAA", "/uploads/b.png"]), &field)
            .is_ok());
        assert!(MediaProcessor.validate(&json!(["not a ref"]), &field).is_err());
        assert_eq!(
            MediaProcessor.format(&Value::StringArray(vec!["/a".into(), "/b".into()]), &field),
            "2 images"
        );
    }
}
