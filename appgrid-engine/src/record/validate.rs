//! Key-by-key validation of record writes

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::relation::RelationResolver;
use crate::types::{Directory, Props, CATEGORY_KEY};
use appgrid_fields::processors::is_blank;
use appgrid_fields::{FieldError, FieldErrors, FieldKind, FieldsContext, Value};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;

/// Creates check every definition; updates check only the supplied keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Create,
    Update,
}

/// Normalized changes ready to merge into a record's props.
#[derive(Debug, Default)]
pub(crate) struct ValidatedWrite {
    pub set: Props,
    /// Keys written as null or blank
    pub unset: Vec<String>,
}

impl ValidatedWrite {
    pub fn apply(self, props: &mut Props) {
        for key in &self.unset {
            props.remove(key);
        }
        props.extend(self.set);
    }
}

/// Validate and normalize `input` against the directory's definitions.
///
/// All problems are collected; the error carries one entry per failing key.
pub(crate) async fn validate_write(
    ctx: &EngineContext,
    directory: &Directory,
    fields: &FieldsContext,
    input: &Map<String, JsonValue>,
    mode: WriteMode,
    roles: Option<&BTreeSet<String>>,
) -> Result<ValidatedWrite> {
    let registry = ctx.registry();
    let mut errors = FieldErrors::new();
    let mut write = ValidatedWrite::default();

    for (key, raw) in input {
        if key == CATEGORY_KEY {
            match category_value(ctx, directory, raw).await {
                Ok(Some(ids)) => {
                    write.set.insert(key.clone(), Value::StringArray(ids));
                }
                Ok(None) => write.unset.push(key.clone()),
                Err(message) => {
                    errors.insert(key.clone(), FieldError::new(message));
                }
            }
            continue;
        }
        if key.starts_with('$') {
            errors.insert(key.clone(), FieldError::new("reserved key"));
            continue;
        }

        let Some(field) = fields.get_field_by_key(key) else {
            if ctx.config().reject_unknown_keys {
                errors.insert(key.clone(), FieldError::new("no field with this key"));
            } else if is_blank(raw) {
                write.unset.push(key.clone());
            } else {
                write.set.insert(key.clone(), Value::from(raw.clone()));
            }
            continue;
        };

        if roles.is_some_and(|roles| !field.can_write(roles)) {
            errors.insert(key.clone(), FieldError::new("not permitted to write this field"));
            continue;
        }
        if let Err(e) = registry.validate(field, Some(raw)) {
            errors.insert(key.clone(), e);
            continue;
        }

        let value = registry.transform(field, raw);
        if value.is_empty() && field.required {
            // Input like " , " for tags passes the shape check but normalizes to nothing
            errors.insert(
                key.clone(),
                FieldError::new(format!("{} is required", field.display_name())),
            );
        } else if value.is_empty() {
            write.unset.push(key.clone());
        } else {
            write.set.insert(key.clone(), value);
        }
    }

    if mode == WriteMode::Create {
        for field in fields.all_fields() {
            if input.contains_key(&field.key) || field.kind == FieldKind::Lookup {
                continue;
            }
            if let Some(default) = &field.default {
                let value = registry.transform(field, default);
                if !value.is_empty() {
                    write.set.insert(field.key.clone(), value);
                    continue;
                }
            }
            if let Err(e) = registry.validate(field, None) {
                errors.insert(field.key.clone(), e);
            }
        }
    }

    // Relation targets must exist; shape was checked above
    let resolver = RelationResolver::new(ctx);
    for (key, value) in &write.set {
        let Some(relation) = fields.get_field_by_key(key).and_then(|f| f.relation.as_ref()) else {
            continue;
        };
        match resolver.missing_ids(relation, &value.ids()).await {
            Ok(missing) if missing.is_empty() => {}
            Ok(missing) => {
                errors.insert(
                    key.clone(),
                    FieldError::new(format!("related record not found: {}", missing.join(", "))),
                );
            }
            Err(EngineError::DirectoryNotFound { id }) => {
                errors.insert(
                    key.clone(),
                    FieldError::new(format!("related directory not found: {id}")),
                );
            }
            Err(e) => return Err(e),
        }
    }

    if errors.is_empty() {
        Ok(write)
    } else {
        Err(EngineError::Validation { errors })
    }
}

/// Resolve a category write to node ids. `None` clears the assignment.
async fn category_value(
    ctx: &EngineContext,
    directory: &Directory,
    raw: &JsonValue,
) -> std::result::Result<Option<Vec<String>>, String> {
    if !directory.supports_category {
        return Err(EngineError::CategoriesDisabled {
            directory: directory.id.to_string(),
        }
        .to_string());
    }
    let path = category_segments(raw).ok_or("category must be a path string or a list of names")?;
    if path.is_empty() {
        return Ok(None);
    }

    let tree = ctx
        .read_category_tree(&directory.id)
        .await
        .map_err(|e| e.to_string())?;
    let ids = tree.resolve(&path).map_err(|e| e.to_string())?;
    Ok(Some(ids.into_iter().map(|id| id.to_string()).collect()))
}

/// Accepts `"a/b/c"` or `["a", "b", "c"]`; segments are ids or names.
pub(crate) fn category_segments(raw: &JsonValue) -> Option<Vec<String>> {
    let segments: Vec<String> = match raw {
        JsonValue::Null => Vec::new(),
        JsonValue::String(s) => s.split('/').map(|seg| seg.trim().to_string()).collect(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()))
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    Some(segments.into_iter().filter(|s| !s.is_empty()).collect())
}
