//! FieldProcessorRegistry: type string -> processor dispatch.
//!
//! The registry is constructed once and handed to whatever needs to validate
//! values. There is no global instance; tests build their own, optionally
//! registering doubles for specific types.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{FieldError, FieldsError, Result};
use crate::processors::{
    is_blank, BooleanProcessor, CascaderProcessor, DateProcessor, DateTimeProcessor,
    EmailProcessor, ExperienceProcessor, FieldProcessor, LookupProcessor, MediaProcessor,
    MultiSelectProcessor, NumberProcessor, ObjectProcessor, RelationProcessor, SelectProcessor,
    TagsProcessor, TextProcessor, UrlProcessor,
};
use crate::types::{field_types as t, is_valid_key, FieldDef};
use crate::value::Value;

/// What to do with a `type` string no processor is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Treat the value as text.
    #[default]
    Fallback,
    /// Refuse the definition and any value written to it.
    Reject,
}

/// Registry of field processors keyed by type string.
pub struct FieldProcessorRegistry {
    processors: HashMap<String, Arc<dyn FieldProcessor>>,
    fallback: Arc<dyn FieldProcessor>,
    unknown_types: UnknownTypePolicy,
}

impl FieldProcessorRegistry {
    /// A registry with no types; everything falls back to text.
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
            fallback: Arc::new(TextProcessor::single_line()),
            unknown_types: UnknownTypePolicy::default(),
        }
    }

    /// All built-in processors.
    pub fn builtin() -> Self {
        Self::empty()
            .with(t::TEXT, TextProcessor::single_line())
            .with(t::TEXTAREA, TextProcessor::multiline())
            .with(t::EMAIL, EmailProcessor::new())
            .with(t::URL, UrlProcessor)
            .with(t::NUMBER, NumberProcessor)
            .with(t::BOOLEAN, BooleanProcessor)
            .with(t::SELECT, SelectProcessor)
            .with(t::MULTISELECT, MultiSelectProcessor)
            .with(t::DATE, DateProcessor)
            .with(t::DATETIME, DateTimeProcessor)
            .with(t::TAGS, TagsProcessor)
            .with(t::EXPERIENCE, ExperienceProcessor)
            .with(t::OBJECT, ObjectProcessor)
            .with(t::RELATION_ONE, RelationProcessor::one())
            .with(t::RELATION_MANY, RelationProcessor::many())
            .with(t::IMAGE, MediaProcessor)
            .with(t::VIDEO, MediaProcessor)
            .with(t::FILE, MediaProcessor)
            .with(t::CASCADER, CascaderProcessor)
            .with(t::LOOKUP, LookupProcessor)
    }

    /// Register (or replace) the processor for a type.
    pub fn with(mut self, type_: impl Into<String>, processor: impl FieldProcessor + 'static) -> Self {
        self.register(type_, Arc::new(processor));
        self
    }

    /// Register (or replace) a shared processor for a type.
    pub fn register(&mut self, type_: impl Into<String>, processor: Arc<dyn FieldProcessor>) {
        self.processors.insert(type_.into(), processor);
    }

    pub fn with_unknown_type_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }

    pub fn unknown_type_policy(&self) -> UnknownTypePolicy {
        self.unknown_types
    }

    pub fn is_registered(&self, type_: &str) -> bool {
        self.processors.contains_key(type_)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Processor for a type, falling back to text for unknown types.
    pub fn get(&self, type_: &str) -> &dyn FieldProcessor {
        match self.processors.get(type_) {
            Some(p) => p.as_ref(),
            None => {
                debug!(type_, "no processor registered, using text");
                self.fallback.as_ref()
            }
        }
    }

    /// Definition-time checks: key shape, known type, processor-specific rules
    /// and a valid default value.
    pub fn check_definition(&self, field: &FieldDef) -> Result<()> {
        if !is_valid_key(&field.key) {
            return Err(FieldsError::invalid_schema(
                &field.key,
                "keys must start with a letter and contain only letters, digits and '_'",
            ));
        }
        if !self.is_registered(&field.type_) {
            match self.unknown_types {
                UnknownTypePolicy::Reject => {
                    return Err(FieldsError::invalid_schema(
                        &field.key,
                        format!("unknown field type '{}'", field.type_),
                    ));
                }
                UnknownTypePolicy::Fallback => {
                    warn!(key = %field.key, type_ = %field.type_, "unknown field type, values will be treated as text");
                }
            }
        }
        self.get(&field.type_)
            .check_definition(field)
            .map_err(|msg| FieldsError::invalid_schema(&field.key, msg))?;
        if let Some(default) = &field.default {
            if !is_blank(default) {
                self.get(&field.type_)
                    .validate(default, field)
                    .map_err(|e| FieldsError::invalid_schema(&field.key, format!("default value {e}")))?;
            }
        }
        Ok(())
    }

    /// Validate a value for a field. `None`, null and blank values only fail
    /// when the field is required.
    pub fn validate(
        &self,
        field: &FieldDef,
        value: Option<&JsonValue>,
    ) -> std::result::Result<(), FieldError> {
        let value = match value {
            Some(v) if !is_blank(v) => v,
            _ if field.required => {
                return Err(FieldError::new(format!("{} is required", field.display_name())))
            }
            _ => return Ok(()),
        };
        if self.unknown_types == UnknownTypePolicy::Reject && !self.is_registered(&field.type_) {
            return Err(FieldError::new(format!("unknown field type '{}'", field.type_)));
        }
        self.get(&field.type_).validate(value, field)
    }

    /// Normalize a validated value. Blank input becomes `Value::Null`.
    pub fn transform(&self, field: &FieldDef, value: &JsonValue) -> Value {
        if is_blank(value) {
            return Value::Null;
        }
        self.get(&field.type_).transform(value, field)
    }

    /// Display text for a stored value.
    pub fn format(&self, field: &FieldDef, value: &Value) -> String {
        self.get(&field.type_).format(value, field)
    }

    /// Zero value for a type, used when coercion gives up.
    pub fn zero_value(&self, type_: &str) -> Value {
        self.get(type_).zero_value()
    }
}

impl Default for FieldProcessorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
