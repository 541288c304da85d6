//! Per-type field processors.
//!
//! A processor validates an incoming JSON value against a field definition,
//! transforms it into the normalized stored [`Value`], and formats a stored
//! value for display. Processors are looked up by the definition's `type`
//! string through [`crate::FieldProcessorRegistry`].
//!
//! Processors only ever see present, non-blank values. Required-ness and
//! blank handling live in the registry so every type treats them the same.

mod choice;
mod date;
mod experience;
mod lookup;
mod number;
mod reference;
mod tags;
mod text;

pub use choice::{CascaderProcessor, MultiSelectProcessor, SelectProcessor};
pub use date::{DateProcessor, DateTimeProcessor};
pub use experience::{ExperienceProcessor, ObjectProcessor};
pub use lookup::LookupProcessor;
pub use number::{BooleanProcessor, NumberProcessor};
pub use reference::{MediaProcessor, RelationProcessor};
pub use tags::TagsProcessor;
pub use text::{EmailProcessor, TextProcessor, UrlProcessor};

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::error::FieldError;
use crate::types::{FieldDef, Validators};
use crate::value::Value;

/// Strategy for one field type.
pub trait FieldProcessor: Send + Sync {
    /// Check a present, non-blank value.
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError>;

    /// Normalize a value that passed validation.
    fn transform(&self, value: &JsonValue, field: &FieldDef) -> Value;

    /// Human-readable rendering of a stored value.
    fn format(&self, value: &Value, field: &FieldDef) -> String {
        let _ = field;
        display_value(value)
    }

    /// Value substituted when a stored value cannot be coerced into this type.
    fn zero_value(&self) -> Value {
        Value::Null
    }

    /// Definition-time check (options present, relation configured, ...).
    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        let _ = field;
        Ok(())
    }
}

/// True for null, blank strings and empty arrays.
pub fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Generic display used when a processor has nothing better.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::StringArray(v) => v.join(", "),
        Value::Object(_) | Value::ObjectArray(_) => value.to_json().to_string(),
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A string or an array of strings, as a list. `None` for any other shape.
pub(crate) fn string_list(value: &JsonValue) -> Option<Vec<String>> {
    match value {
        JsonValue::String(s) => Some(vec![s.clone()]),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Keep the first occurrence of each entry.
pub(crate) fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Compiled `pattern` validators, keyed by pattern source.
///
/// Owned by a processor instance, so each registry compiles a pattern once.
#[derive(Default)]
pub(crate) struct PatternCache {
    compiled: DashMap<String, Regex>,
}

impl PatternCache {
    pub fn get(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(re) = self.compiled.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern)?;
        self.compiled.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled.len()
    }
}

/// Apply `minLength`, `maxLength` and `pattern` to a string.
pub(crate) fn check_text_validators(
    s: &str,
    validators: &Validators,
    patterns: &PatternCache,
) -> Result<(), FieldError> {
    let len = s.chars().count();
    if let Some(min) = validators.min_length {
        if len < min {
            return Err(FieldError::new(format!("must be at least {min} characters")));
        }
    }
    if let Some(max) = validators.max_length {
        if len > max {
            return Err(FieldError::new(format!("must be at most {max} characters")));
        }
    }
    if let Some(pattern) = &validators.pattern {
        let re = patterns
            .get(pattern)
            .map_err(|e| FieldError::new(format!("invalid pattern '{pattern}': {e}")))?;
        if !re.is_match(s) {
            return Err(FieldError::new(format!("must match pattern '{pattern}'")));
        }
    }
    Ok(())
}

/// Definition-time check that a `pattern` validator compiles.
pub(crate) fn check_pattern_definition(field: &FieldDef) -> Result<(), String> {
    match &field.validators.pattern {
        Some(pattern) => Regex::new(pattern)
            .map(|_| ())
            .map_err(|e| format!("invalid pattern '{pattern}': {e}")),
        None => Ok(()),
    }
}
