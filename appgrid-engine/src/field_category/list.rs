//! ListFieldCategories command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::DirectoryId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List a directory's field categories
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFieldCategories {
    pub directory_id: DirectoryId,
}

operation!(
    ListFieldCategories,
    verb = "list",
    noun = "field categories",
    description = "List field categories of a directory"
);

impl ListFieldCategories {
    pub fn new(directory_id: impl Into<DirectoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for ListFieldCategories {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            ctx.read_directory(&self.directory_id).await?;
            let categories = ctx.read_all_field_categories(&self.directory_id).await?;
            Ok(serde_json::json!({
                "count": categories.len(),
                "categories": categories,
            }))
        }
        .await;

        unlogged(result)
    }
}
