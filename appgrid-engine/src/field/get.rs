//! GetField command

use super::schema::find_field;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::DirectoryId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Get a field definition by id or key
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetField {
    pub directory_id: DirectoryId,
    /// Field ULID or key
    pub field: String,
}

operation!(
    GetField,
    verb = "get",
    noun = "field",
    description = "Retrieve a field definition"
);

impl GetField {
    pub fn new(directory_id: impl Into<DirectoryId>, field: impl Into<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            field: field.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for GetField {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let fields = ctx.fields(&self.directory_id).await?;
            Ok(serde_json::to_value(find_field(&fields, &self.field)?)?)
        }
        .await;

        unlogged(result)
    }
}
