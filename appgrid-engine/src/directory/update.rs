//! UpdateDirectory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryConfig, DirectoryId, DirectoryKind};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Update directory metadata
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDirectory {
    pub id: DirectoryId,
    pub name: Option<String>,
    pub kind: Option<DirectoryKind>,
    pub supports_category: Option<bool>,
    pub order: Option<i32>,
    pub is_enabled: Option<bool>,
    pub config: Option<DirectoryConfig>,
}

operation!(
    UpdateDirectory,
    verb = "update",
    noun = "directory",
    description = "Update directory properties"
);

impl UpdateDirectory {
    pub fn new(id: impl Into<DirectoryId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: None,
            supports_category: None,
            order: None,
            is_enabled: None,
            config: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_kind(mut self, kind: DirectoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_supports_category(mut self, supports: bool) -> Self {
        self.supports_category = Some(supports);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = Some(enabled);
        self
    }

    pub fn with_config(mut self, config: DirectoryConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for UpdateDirectory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let mut directory = ctx.read_directory(&self.id).await?;

            if let Some(name) = &self.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(EngineError::invalid_schema("name", "directory name cannot be empty"));
                }
                directory.name = name.to_string();
            }
            if let Some(kind) = self.kind {
                directory.kind = kind;
            }
            if let Some(supports) = self.supports_category {
                directory.supports_category = supports;
            }
            if let Some(order) = self.order {
                directory.order = order;
            }
            if let Some(enabled) = self.is_enabled {
                directory.is_enabled = enabled;
            }
            if let Some(config) = &self.config {
                directory.config = config.clone();
            }
            directory.updated_at = Utc::now();

            ctx.write_directory(&directory).await?;
            Ok(serde_json::to_value(&directory)?)
        }
        .await;

        logged(self, start, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CreateDirectory;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_update_directory() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let created = CreateDirectory::new("app", "crm", "Contacts")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        let result = UpdateDirectory::new(created["id"].as_str().unwrap())
            .with_name("People")
            .with_enabled(false)
            .with_supports_category(true)
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result["name"], "People");
        assert_eq!(result["isEnabled"], false);
        assert_eq!(result["supportsCategory"], true);
        assert_eq!(result["applicationId"], "app");
    }
}
