//! RenameCategory command

use super::category_directory;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{CategoryId, DirectoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rename a category node. Records store ids, so nothing else changes.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameCategory {
    pub directory_id: DirectoryId,
    pub id: CategoryId,
    pub name: String,
}

operation!(
    RenameCategory,
    verb = "rename",
    noun = "category",
    description = "Rename a record category"
);

impl RenameCategory {
    pub fn new(
        directory_id: impl Into<DirectoryId>,
        id: impl Into<CategoryId>,
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
impl Execute<EngineContext, EngineError> for RenameCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            category_directory(ctx, &self.directory_id).await?;
            let mut tree = ctx.read_category_tree(&self.directory_id).await?;
            tree.rename(&self.id, &self.name)?;
            ctx.write_category_tree(&self.directory_id, &tree).await?;
            Ok(serde_json::json!({ "id": self.id, "name": self.name.trim() }))
        }
        .await;

        logged(self, start, result)
    }
}
