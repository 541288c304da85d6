//! Text-like processors: text, textarea, email, url.

use regex::Regex;
use serde_json::Value as JsonValue;

use super::{check_pattern_definition, check_text_validators, FieldProcessor, PatternCache};
use crate::error::FieldError;
use crate::types::FieldDef;
use crate::value::Value;

/// Plain text. Single-line text is trimmed on transform; textarea keeps whitespace.
pub struct TextProcessor {
    multiline: bool,
    patterns: PatternCache,
}

impl TextProcessor {
    pub fn single_line() -> Self {
        Self {
            multiline: false,
            patterns: PatternCache::default(),
        }
    }

    pub fn multiline() -> Self {
        Self {
            multiline: true,
            patterns: PatternCache::default(),
        }
    }
}

fn expect_str(value: &JsonValue) -> Result<&str, FieldError> {
    value
        .as_str()
        .ok_or_else(|| FieldError::new("must be a string"))
}

impl FieldProcessor for TextProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let s = expect_str(value)?;
        check_text_validators(s.trim(), &field.validators, &self.patterns)
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        match value.as_str() {
            Some(s) if self.multiline => Value::String(s.to_string()),
            Some(s) => Value::String(s.trim().to_string()),
            None => Value::Null,
        }
    }

    fn zero_value(&self) -> Value {
        Value::String(String::new())
    }

    fn check_definition(&self, field: &FieldDef) -> Result<(), String> {
        check_pattern_definition(field)
    }
}

/// An email address.
pub struct EmailProcessor {
    re: Regex,
    patterns: PatternCache,
}

impl EmailProcessor {
    pub fn new() -> Self {
        Self {
            re: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex"),
            patterns: PatternCache::default(),
        }
    }
}

impl Default for EmailProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldProcessor for EmailProcessor {
    fn validate(&self, value: &JsonValue, field: &FieldDef) -> Result<(), FieldError> {
        let s = expect_str(value)?.trim();
        if !self.re.is_match(s) {
            return Err(FieldError::new("must be a valid email address"));
        }
        check_text_validators(s, &field.validators, &self.patterns)
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        value
            .as_str()
            .map(|s| Value::String(s.trim().to_lowercase()))
            .unwrap_or_default()
    }

    fn zero_value(&self) -> Value {
        Value::String(String::new())
    }
}

/// An absolute http(s) URL.
pub struct UrlProcessor;

impl FieldProcessor for UrlProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        let s = expect_str(value)?.trim();
        match url::Url::parse(s) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(()),
            Ok(u) => Err(FieldError::new(format!(
                "unsupported URL scheme '{}'",
                u.scheme()
            ))),
            Err(e) => Err(FieldError::new(format!("must be a valid URL: {e}"))),
        }
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        value
            .as_str()
            .map(|s| Value::String(s.trim().to_string()))
            .unwrap_or_default()
    }

    fn zero_value(&self) -> Value {
        Value::String(String::new())
    }
}
