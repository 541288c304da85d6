//! Option-backed processors: select, multiselect, cascader.

use serde_json::Value as JsonValue;

use super::{dedup, string_list, FieldProcessor};
use crate::error::FieldError;
use crate::types::{FieldDef, SelectOption};
use crate::value::Value;

fn find_option<'a>(options: &'a [SelectOption], value: &str) -> Option<&'a SelectOption> {
    options.iter().find(|o| o.value == value)
}

fn option_label(field: &FieldDef, value: &str) -> String {
    find_option(&field.options, value)
        .map(|o| o.display().to_string())
        .unwrap_or_else(|| value.to_string())
}

fn require_options(field: &FieldDef) -> Result<(), String> {
    if field.options.is_empty() {
        Err(format!("'{}' fields need at least one option", field.type_))
    } else {
        Ok(())
    }
}

/// Option values are strings; numbers and booleans are accepted by their text.
fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One value out of `options`.
pub struct SelectProcessor;

impl FieldProcessor for SelectProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let v = scalar_text(value).ok_or_else(|| FieldError::new("must be a single option"))?;
        if find_option(&field.options, &v).is_none() {
            return Err(FieldError::new(format!("'{v}' is not a valid option")));
        }
        Ok(())
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        scalar_text(value).map(Value::String).unwrap_or_default()
    }

    fn format(&self, value: &Value, field: &FieldDef) -> String {
        value
            .as_str()
            .map(|v| option_label(field, v))
            .unwrap_or_default()
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        require_options(field)
    }
}

/// Any number of values out of `options`. A single string is treated as a one-item list.
pub struct MultiSelectProcessor;

impl FieldProcessor for MultiSelectProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let values =
            string_list(value).ok_or_else(|| FieldError::new("must be a list of options"))?;
        let invalid: Vec<_> = values
            .iter()
            .filter(|v| find_option(&field.options, v).is_none())
            .map(|v| format!("'{v}'"))
            .collect();
        if !invalid.is_empty() {
            return Err(FieldError::new(format!(
                "{} not valid option(s)",
                invalid.join(", ")
            )));
        }
        if let Some(max) = field.validators.max_length {
            if values.len() > max {
                return Err(FieldError::new(format!("choose at most {max} options")));
            }
        }
        Ok(())
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        Value::StringArray(dedup(string_list(value).unwrap_or_default()))
    }

    fn format(&self, value: &Value, field: &FieldDef) -> String {
        value
            .as_string_array()
            .map(|vs| {
                vs.iter()
                    .map(|v| option_label(field, v))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    fn zero_value(&self) -> Value {
        Value::StringArray(Vec::new())
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        require_options(field)
    }
}

/// A path through the nested option tree, e.g. `["asia", "japan", "tokyo"]`.
pub struct CascaderProcessor;

impl CascaderProcessor {
    /// Walk `path` through `options`, returning the matched options in order.
    fn walk<'a>(
        options: &'a [SelectOption],
        path: &[String],
    ) -> Result<Vec<&'a SelectOption>, String> {
        let mut level = options;
        let mut matched = Vec::with_capacity(path.len());
        for (depth, segment) in path.iter().enumerate() {
            let opt = find_option(level, segment)
                .ok_or_else(|| format!("'{segment}' is not a valid option at level {}", depth + 1))?;
            matched.push(opt);
            level = &opt.children;
        }
        Ok(matched)
    }
}

impl FieldProcessor for CascaderProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let path = string_list(value).ok_or_else(|| FieldError::new("must be an option path"))?;
        Self::walk(&field.options, &path)
            .map(|_| ())
            .map_err(FieldError::new)
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        Value::StringArray(string_list(value).unwrap_or_default())
    }

    fn format(&self, value: &Value, field: &FieldDef) -> String {
        let Some(path) = value.as_string_array() else {
            return String::new();
        };
        match Self::walk(&field.options, path) {
            Ok(opts) => opts
                .iter()
                .map(|o| o.display())
                .collect::<Vec<_>>()
                .join(" / "),
            Err(_) => path.join(" / "),
        }
    }

    fn zero_value(&self) -> Value {
        Value::StringArray(Vec::new())
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        require_options(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status() -> FieldDef {
        FieldDef::new("status", "select").with_options(vec![
            SelectOption::new("open").with_label("Open"),
            SelectOption::new("closed"),
        ])
    }

    fn region() -> FieldDef {
        FieldDef::new("region", "cascader").with_options(vec![SelectOption::new("asia")
            .with_label("Asia")
            .with_children(vec![SelectOption::new("japan")
                .with_label("Japan")
                .with_children(vec![SelectOption::new("tokyo").with_label("Tokyo")])])])
    }

    #[test]
    fn select_checks_options() {
        let field = status();
        assert!(SelectProcessor.validate(&json!("open"), &field).is_ok());
        let err = SelectProcessor.validate(&json!("pending"), &field).unwrap_err();
        assert_eq!(err.message, "'pending' is not a valid option");
        assert_eq!(SelectProcessor.format(&Value::from("open"), &field), "Open");
    }

    #[test]
    fn select_without_options_is_invalid_schema() {
        let field = FieldDef::new("status", "select");
        assert!(SelectProcessor.check_definition(&field).is_err());
    }

    #[test]
    fn multiselect_wraps_and_dedups() {
        let field = status();
        assert!(MultiSelectProcessor.validate(&json!(["open", "closed"]), &field).is_ok());
        assert!(MultiSelectProcessor.validate(&json!(["open", "x"]), &field).is_err());
        assert_eq!(
            MultiSelectProcessor.transform(&json!("open"), &field),
            Value::StringArray(vec!["open".into()])
        );
        assert_eq!(
            MultiSelectProcessor.transform(&json!(["open", "open", "closed"]), &field),
            Value::StringArray(vec!["open".into(), "closed".into()])
        );
    }

    #[test]
    fn cascader_paths() {
        let field = region();
        assert!(CascaderProcessor
            .validate(&json!(["asia", "japan", "tokyo"]), &field)
            .is_ok());
        assert!(CascaderProcessor.validate(&json!(["asia"]), &field).is_ok());
        let err = CascaderProcessor
            .validate(&json!(["asia", "korea"]), &field)
            .unwrap_err();
        assert!(err.message.contains("level 2"));
        let stored = CascaderProcessor.transform(&json!(["asia", "japan"]), &field);
        assert_eq!(CascaderProcessor.format(&stored, &field), "Asia / Japan");
    }
}
