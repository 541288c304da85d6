//! Core field definition types.
//!
//! All types serialize to/from YAML via serde. A field definition describes
//! one named, typed property of the records in a directory. The `type` is a
//! plain string so new types can be added by registering a processor.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Well-known type names for the built-in processors.
pub mod field_types {
    pub const TEXT: &str = "text";
    pub const TEXTAREA: &str = "textarea";
    pub const EMAIL: &str = "email";
    pub const URL: &str = "url";
    pub const NUMBER: &str = "number";
    pub const BOOLEAN: &str = "boolean";
    pub const SELECT: &str = "select";
    pub const MULTISELECT: &str = "multiselect";
    pub const DATE: &str = "date";
    pub const DATETIME: &str = "datetime";
    pub const TAGS: &str = "tags";
    pub const EXPERIENCE: &str = "experience";
    pub const OBJECT: &str = "object";
    pub const RELATION_ONE: &str = "relation_one";
    pub const RELATION_MANY: &str = "relation_many";
    pub const IMAGE: &str = "image";
    pub const VIDEO: &str = "video";
    pub const FILE: &str = "file";
    pub const CASCADER: &str = "cascader";
    pub const LOOKUP: &str = "lookup";
}

/// Coarse category of a field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    #[default]
    Primitive,
    Composite,
    Relation,
    Lookup,
}

impl FieldKind {
    /// Infer the kind from a type string.
    pub fn for_type(type_: &str) -> Self {
        match type_ {
            field_types::EXPERIENCE | field_types::OBJECT => FieldKind::Composite,
            field_types::RELATION_ONE | field_types::RELATION_MANY => FieldKind::Relation,
            field_types::LOOKUP => FieldKind::Lookup,
            _ => FieldKind::Primitive,
        }
    }
}

/// A single option in a select, multiselect or cascader field.
///
/// Cascader options nest through `children`; flat selects leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SelectOption>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            color: None,
            order: 0,
            children: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SelectOption>) -> Self {
        self.children = children;
        self
    }

    /// Label if set, otherwise the raw value.
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// Whether a relation holds one id or many.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RelationMode {
    One,
    Many,
}

/// Target of a relation field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelationConfig {
    pub target_directory_id: String,
    pub mode: RelationMode,
    /// Project only this key of the target record when resolving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field_key: Option<String>,
    /// UI hint only. No inverse field is generated on the target.
    #[serde(default)]
    pub bidirectional: bool,
}

/// Source of a lookup field: `"<relation key>.<target key>"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupConfig {
    pub source: String,
}

impl LookupConfig {
    /// Split the source into the relation key and the projected target key.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let (relation, target) = self.source.split_once('.')?;
        if relation.is_empty() || target.is_empty() {
            return None;
        }
        Some((relation, target))
    }
}

/// Optional value constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Validators {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Validators {
    pub fn is_empty(&self) -> bool {
        *self == Validators::default()
    }
}

/// A field definition: the complete schema for one property of a directory's records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub id: Ulid,
    #[serde(default)]
    pub directory_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupConfig>,
    #[serde(default, skip_serializing_if = "Validators::is_empty")]
    pub validators: Validators,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub read_roles: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub write_roles: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// Included in free-text record search when the directory names no search fields.
    #[serde(default)]
    pub searchable: bool,
}

impl FieldDef {
    /// New definition with a fresh id; the kind is inferred from the type.
    pub fn new(key: impl Into<String>, type_: impl Into<String>) -> Self {
        let type_ = type_.into();
        Self {
            id: Ulid::new(),
            directory_id: String::new(),
            key: key.into(),
            label: None,
            description: None,
            kind: FieldKind::for_type(&type_),
            type_,
            options: Vec::new(),
            schema: None,
            relation: None,
            lookup: None,
            validators: Validators::default(),
            required: false,
            read_roles: BTreeSet::new(),
            write_roles: BTreeSet::new(),
            category_id: None,
            order: 0,
            default: None,
            searchable: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_schema(mut self, schema: JsonValue) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Relation to another directory. The mode follows the type.
    pub fn with_relation(mut self, target_directory_id: impl Into<String>) -> Self {
        let mode = if self.type_ == field_types::RELATION_MANY {
            RelationMode::Many
        } else {
            RelationMode::One
        };
        self.relation = Some(RelationConfig {
            target_directory_id: target_directory_id.into(),
            mode,
            display_field_key: None,
            bidirectional: false,
        });
        self
    }

    /// Project this key of related records when resolving.
    pub fn with_display_field(mut self, key: impl Into<String>) -> Self {
        if let Some(rel) = self.relation.as_mut() {
            rel.display_field_key = Some(key.into());
        }
        self
    }

    pub fn with_lookup(mut self, source: impl Into<String>) -> Self {
        self.lookup = Some(LookupConfig {
            source: source.into(),
        });
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_read_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_write_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Label if set, otherwise the key.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// An empty role set means everyone may read.
    pub fn can_read(&self, roles: &BTreeSet<String>) -> bool {
        self.read_roles.is_empty() || !self.read_roles.is_disjoint(roles)
    }

    /// An empty role set means everyone may write.
    pub fn can_write(&self, roles: &BTreeSet<String>) -> bool {
        self.write_roles.is_empty() || !self.write_roles.is_disjoint(roles)
    }
}

/// Check a field key: a letter followed by letters, digits or underscores.
///
/// Keys starting with `$` are reserved for engine-managed properties.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
