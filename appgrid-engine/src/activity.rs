//! Audit log queries

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::{DirectoryId, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read the global activity log, newest first
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReadActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

operation!(
    ReadActivity,
    verb = "read",
    noun = "activity",
    description = "Read recent operations from the activity log"
);

impl ReadActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for ReadActivity {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let entries = ctx.read_activity(self.limit).await?;
            Ok(serde_json::json!({ "count": entries.len(), "entries": entries }))
        }
        .await;

        unlogged(result)
    }
}

/// Read one record's operation log, newest first
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordHistory {
    pub directory_id: DirectoryId,
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

operation!(
    GetRecordHistory,
    verb = "get",
    noun = "record history",
    description = "Read the operation log of a record"
);

impl GetRecordHistory {
    pub fn new(directory_id: impl Into<DirectoryId>, id: impl Into<RecordId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for GetRecordHistory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            // Existence check; hard-deleted records have no history left
            ctx.read_record(&self.directory_id, &self.id).await?;
            let entries = ctx
                .read_record_log(&self.directory_id, &self.id, self.limit)
                .await?;
            Ok(serde_json::json!({ "count": entries.len(), "entries": entries }))
        }
        .await;

        unlogged(result)
    }
}
