//! GetDirectory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::DirectoryId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Get a directory with its field definitions
#[derive(Debug, Deserialize, Serialize)]
pub struct GetDirectory {
    pub id: DirectoryId,
}

operation!(
    GetDirectory,
    verb = "get",
    noun = "directory",
    description = "Retrieve a directory and its fields"
);

impl GetDirectory {
    pub fn new(id: impl Into<DirectoryId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for GetDirectory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let directory = ctx.read_directory(&self.id).await?;
            let fields = ctx.fields(&self.id).await?;

            let mut value = serde_json::to_value(&directory)?;
            value["fields"] = serde_json::to_value(fields.all_fields())?;
            Ok(value)
        }
        .await;

        unlogged(result)
    }
}
