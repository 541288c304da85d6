//! CreateFieldCategory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, FieldCategory};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create a field category
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldCategory {
    pub directory_id: DirectoryId,
    pub name: String,
    #[serde(default)]
    pub order: i32,
    /// System categories are engine-managed; asking for one is refused
    #[serde(default)]
    pub system: bool,
}

operation!(
    CreateFieldCategory,
    verb = "create",
    noun = "field category",
    description = "Create a field category"
);

impl CreateFieldCategory {
    pub fn new(directory_id: impl Into<DirectoryId>, name: impl Into<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            name: name.into(),
            order: 0,
            system: false,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for CreateFieldCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            ctx.read_directory(&self.directory_id).await?;

            let name = self.name.trim();
            if self.system {
                return Err(EngineError::SystemFieldCategory {
                    id: name.to_string(),
                });
            }
            if name.is_empty() {
                return Err(EngineError::invalid_schema("name", "field category name cannot be empty"));
            }
            let existing = ctx.read_all_field_categories(&self.directory_id).await?;
            if existing.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
                return Err(EngineError::DuplicateKey {
                    key: name.to_string(),
                });
            }

            let mut category = FieldCategory::new(self.directory_id.clone(), name);
            category.order = self.order;
            ctx.write_field_category(&category).await?;
            Ok(serde_json::to_value(&category)?)
        }
        .await;

        logged(self, start, result)
    }
}
