//! Error types for field definitions and field values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for fields operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in field definition operations
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Field not found by key
    #[error("field not found: {key}")]
    FieldNotFound { key: String },

    /// Field not found by ULID
    #[error("field not found by id: {id}")]
    FieldNotFoundById { id: String },

    /// Another field in the same directory already uses this key
    #[error("duplicate field key: {key}")]
    DuplicateKey { key: String },

    /// The definition itself is malformed (missing options, bad relation, ...)
    #[error("invalid schema for field '{key}': {message}")]
    InvalidSchema { key: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FieldsError {
    /// Create an invalid schema error
    pub fn invalid_schema(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// A validation failure for one field value.
///
/// Composite values (arrays of objects) report problems per item, keyed by
/// the item's array index, in addition to the summary message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub items: BTreeMap<usize, String>,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            items: BTreeMap::new(),
        }
    }

    /// Build an error from per-item messages.
    pub fn from_items(items: BTreeMap<usize, String>) -> Self {
        let message = if items.len() == 1 {
            "1 item is invalid".to_string()
        } else {
            format!("{} items are invalid", items.len())
        };
        Self { message, items }
    }

    /// Message for a single array item, if that item failed.
    pub fn item(&self, index: usize) -> Option<&str> {
        self.items.get(&index).map(String::as_str)
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for (idx, msg) in &self.items {
            write!(f, "; [{idx}] {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// Per-field validation errors for a whole write, keyed by field key.
pub type FieldErrors = BTreeMap<String, FieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::FieldNotFound {
            key: "status".into(),
        };
        assert_eq!(err.to_string(), "field not found: status");
    }

    #[test]
    fn test_invalid_schema_error() {
        let err = FieldsError::invalid_schema("owner", "relation config is required");
        assert!(err.to_string().contains("owner"));
        assert!(err.to_string().contains("relation config is required"));
    }

    #[test]
    fn field_error_lists_items() {
        let mut items = BTreeMap::new();
        items.insert(2, "missing title".to_string());
        let err = FieldError::from_items(items);
        assert_eq!(err.item(2), Some("missing title"));
        assert_eq!(err.item(0), None);
        assert_eq!(err.to_string(), "1 item is invalid; [2] missing title");
    }
}
