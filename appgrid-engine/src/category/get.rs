//! GetCategoryTree command

use super::category_directory;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::DirectoryId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Get a directory's category tree
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCategoryTree {
    pub directory_id: DirectoryId,
}

operation!(
    GetCategoryTree,
    verb = "get",
    noun = "category tree",
    description = "Retrieve the record category tree of a directory"
);

impl GetCategoryTree {
    pub fn new(directory_id: impl Into<DirectoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for GetCategoryTree {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            category_directory(ctx, &self.directory_id).await?;
            let tree = ctx.read_category_tree(&self.directory_id).await?;
            Ok(serde_json::to_value(&tree)?)
        }
        .await;

        unlogged(result)
    }
}
