//! Directory metadata

use super::ids::DirectoryId;
use super::query::SortOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a directory is presented; storage is identical for every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    #[default]
    Table,
    Category,
    Form,
}

/// Default ordering for record lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field key, or one of `createdAt`, `updatedAt`, `version`
    pub by: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// Per-directory list behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// Keys searched by free-text list queries. Empty means searchable fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<SortSpec>,
}

/// A user-defined table inside an application module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    pub id: DirectoryId,
    pub application_id: String,
    pub module_id: String,
    pub name: String,
    #[serde(default)]
    pub kind: DirectoryKind,
    #[serde(default)]
    pub supports_category: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub config: DirectoryConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Directory {
    pub fn new(
        application_id: impl Into<String>,
        module_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DirectoryId::new(),
            application_id: application_id.into(),
            module_id: module_id.into(),
            name: name.into(),
            kind: DirectoryKind::default(),
            supports_category: false,
            order: 0,
            is_enabled: true,
            config: DirectoryConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
