//! Error types for the record engine

use appgrid_fields::{FieldError, FieldErrors, FieldsError};
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// One or more supplied values failed validation, keyed by field
    #[error("validation failed: {}", summarize(.errors))]
    Validation { errors: FieldErrors },

    /// The record changed since the caller read it
    #[error("version conflict on record {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Directory not found
    #[error("directory not found: {id}")]
    DirectoryNotFound { id: String },

    /// Record not found (or soft-deleted)
    #[error("record not found: {id}")]
    RecordNotFound { id: String },

    /// Identifier that cannot name a storage entry (empty, `.`/`..`, or containing a separator)
    #[error("invalid identifier: '{id}'")]
    InvalidId { id: String },

    /// Field definition not found
    #[error("field not found: {id}")]
    FieldNotFound { id: String },

    /// Field category not found
    #[error("field category not found: {id}")]
    FieldCategoryNotFound { id: String },

    /// Key already used in the directory
    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    /// Field definition rejected at definition time
    #[error("invalid schema for '{key}': {message}")]
    InvalidSchema { key: String, message: String },

    /// A category path segment did not resolve
    #[error("category not found: {path}")]
    CategoryNotFound { path: String },

    /// Category trees are limited in depth
    #[error("category tree is limited to {max} levels")]
    CategoryDepthExceeded { max: usize },

    /// Records may only be assigned to leaf categories
    #[error("category '{id}' has children; assign a leaf category")]
    CategoryNotLeaf { id: String },

    /// Directory does not support record categories
    #[error("directory '{directory}' does not support categories")]
    CategoriesDisabled { directory: String },

    /// System field categories are immutable
    #[error("field category '{id}' is a system category and cannot be changed")]
    SystemFieldCategory { id: String },

    /// Field category still groups fields
    #[error("field category '{id}' has {count} fields and cannot be deleted")]
    FieldCategoryNotEmpty { id: String, count: usize },

    /// No incomplete migration with this id
    #[error("migration not found: {id}")]
    MigrationNotFound { id: String },

    /// Field definition store error
    #[error(transparent)]
    Fields(FieldsError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(Box<figment::Error>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(key, err)| format!("{key}: {err}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl EngineError {
    /// Validation error for a single key
    pub fn validation(key: impl Into<String>, error: FieldError) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.into(), error);
        Self::Validation { errors }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Per-field errors, if this is a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }

    /// Only version conflicts are worth retrying, after a refetch
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<FieldsError> for EngineError {
    fn from(err: FieldsError) -> Self {
        match err {
            FieldsError::FieldNotFound { key } => Self::FieldNotFound { id: key },
            FieldsError::FieldNotFoundById { id } => Self::FieldNotFound { id },
            FieldsError::DuplicateKey { key } => Self::DuplicateKey { key },
            FieldsError::InvalidSchema { key, message } => Self::InvalidSchema { key, message },
            FieldsError::Io(e) => Self::Io(e),
            other => Self::Fields(other),
        }
    }
}

impl From<figment::Error> for EngineError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
