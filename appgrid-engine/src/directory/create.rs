//! CreateDirectory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{
    CategoryTree, Directory, DirectoryConfig, DirectoryKind, FieldCategory,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Create a directory with an empty category tree and the "General" field category
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDirectory {
    pub application_id: String,
    pub module_id: String,
    pub name: String,
    #[serde(default)]
    pub kind: DirectoryKind,
    #[serde(default)]
    pub supports_category: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub config: DirectoryConfig,
}

operation!(
    CreateDirectory,
    verb = "create",
    noun = "directory",
    description = "Create a directory in an application module"
);

impl CreateDirectory {
    pub fn new(
        application_id: impl Into<String>,
        module_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            module_id: module_id.into(),
            name: name.into(),
            kind: DirectoryKind::default(),
            supports_category: false,
            order: 0,
            config: DirectoryConfig::default(),
        }
    }

    pub fn with_kind(mut self, kind: DirectoryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Allow records to be assigned to categories
    pub fn with_categories(mut self) -> Self {
        self.supports_category = true;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_config(mut self, config: DirectoryConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for CreateDirectory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let name = self.name.trim();
            if name.is_empty() {
                return Err(EngineError::invalid_schema("name", "directory name cannot be empty"));
            }

            let mut directory = Directory::new(&self.application_id, &self.module_id, name);
            directory.kind = self.kind;
            directory.supports_category = self.supports_category;
            directory.order = self.order;
            directory.config = self.config.clone();

            ctx.create_directory_dirs(&directory.id).await?;
            ctx.write_category_tree(&directory.id, &CategoryTree::default())
                .await?;
            ctx.write_field_category(&FieldCategory::general(directory.id.clone()))
                .await?;
            ctx.write_directory(&directory).await?;

            info!(directory = %directory.id, name = %directory.name, "directory created");
            Ok(serde_json::to_value(&directory)?)
        }
        .await;

        logged(self, start, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DirectoryId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_directory_seeds_storage() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());

        let result = CreateDirectory::new("app", "crm", "Contacts")
            .with_categories()
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result["name"], "Contacts");
        assert_eq!(result["supportsCategory"], true);
        assert_eq!(result["isEnabled"], true);

        let id = DirectoryId::from_string(result["id"].as_str().unwrap());
        assert!(ctx.categories_path(&id).exists());
        let cats = ctx.read_all_field_categories(&id).await.unwrap();
        assert_eq!(cats.len(), 1);
        assert!(cats[0].system);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());

        let result = CreateDirectory::new("app", "crm", "  ")
            .execute(&ctx)
            .await
            .into_result();
        assert!(matches!(result, Err(EngineError::InvalidSchema { .. })));
    }
}
