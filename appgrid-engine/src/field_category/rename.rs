//! RenameFieldCategory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, FieldCategoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rename a non-system field category
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFieldCategory {
    pub directory_id: DirectoryId,
    pub id: FieldCategoryId,
    pub name: String,
}

operation!(
    RenameFieldCategory,
    verb = "rename",
    noun = "field category",
    description = "Rename a field category"
);

impl RenameFieldCategory {
    pub fn new(
        directory_id: impl Into<DirectoryId>,
        id: impl Into<FieldCategoryId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for RenameFieldCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let mut category = ctx.read_field_category(&self.directory_id, &self.id).await?;
            if category.system {
                return Err(EngineError::SystemFieldCategory {
                    id: self.id.to_string(),
                });
            }
            let name = self.name.trim();
            if name.is_empty() {
                return Err(EngineError::invalid_schema("name", "field category name cannot be empty"));
            }
            let taken = ctx
                .read_all_field_categories(&self.directory_id)
                .await?
                .into_iter()
                .any(|c| c.id != category.id && c.name.eq_ignore_ascii_case(name));
            if taken {
                return Err(EngineError::DuplicateKey {
                    key: name.to_string(),
                });
            }
            category.name = name.to_string();
            ctx.write_field_category(&category).await?;
            Ok(serde_json::to_value(&category)?)
        }
        .await;

        logged(self, start, result)
    }
}
