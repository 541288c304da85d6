//! DeleteDirectory command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::DirectoryId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Delete a directory with its fields, categories and records
///
/// Refused while another directory has a relation field targeting it.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteDirectory {
    pub id: DirectoryId,
}

operation!(
    DeleteDirectory,
    verb = "delete",
    noun = "directory",
    description = "Delete a directory and everything in it"
);

impl DeleteDirectory {
    pub fn new(id: impl Into<DirectoryId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for DeleteDirectory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            ctx.read_directory(&self.id).await?;

            for other in ctx.list_directory_ids().await? {
                if other == self.id {
                    continue;
                }
                let fields = ctx.fields(&other).await?;
                let referencing = fields.all_fields().into_iter().find(|f| {
                    f.relation
                        .as_ref()
                        .is_some_and(|r| r.target_directory_id == self.id.as_str())
                });
                if let Some(field) = referencing {
                    return Err(EngineError::invalid_schema(
                        &field.key,
                        format!("relation in directory {other} still targets {}", self.id),
                    ));
                }
            }

            let records = ctx.list_record_ids(&self.id).await?.len();
            ctx.delete_directory_dir(&self.id).await?;
            info!(directory = %self.id, records, "directory deleted");

            Ok(serde_json::json!({
                "id": self.id,
                "deleted": true,
                "records": records,
            }))
        }
        .await;

        logged(self, start, result)
    }
}
