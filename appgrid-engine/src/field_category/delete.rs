//! DeleteFieldCategory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, FieldCategoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delete an empty, non-system field category
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFieldCategory {
    pub directory_id: DirectoryId,
    pub id: FieldCategoryId,
}

operation!(
    DeleteFieldCategory,
    verb = "delete",
    noun = "field category",
    description = "Delete a field category"
);

impl DeleteFieldCategory {
    pub fn new(directory_id: impl Into<DirectoryId>, id: impl Into<FieldCategoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for DeleteFieldCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let category = ctx.read_field_category(&self.directory_id, &self.id).await?;
            if category.system {
                return Err(EngineError::SystemFieldCategory {
                    id: self.id.to_string(),
                });
            }
            if !category.field_ids.is_empty() {
                return Err(EngineError::FieldCategoryNotEmpty {
                    id: self.id.to_string(),
                    count: category.field_ids.len(),
                });
            }
            ctx.delete_field_category_file(&self.directory_id, &self.id)
                .await?;
            Ok(serde_json::json!({ "id": self.id, "deleted": true }))
        }
        .await;

        logged(self, start, result)
    }
}
