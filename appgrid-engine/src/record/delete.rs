//! DeleteRecord command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, record_ref, Execute, ExecutionResult};
use crate::types::{DirectoryId, RecordId};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Delete a record: soft by default, permanently with `hard`
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecord {
    pub directory_id: DirectoryId,
    pub id: RecordId,
    #[serde(default)]
    pub hard: bool,
}

operation!(
    DeleteRecord,
    verb = "delete",
    noun = "record",
    description = "Delete a record"
);

impl DeleteRecord {
    pub fn new(directory_id: impl Into<DirectoryId>, id: impl Into<RecordId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
            hard: false,
        }
    }

    /// Remove the record file and its log instead of marking it deleted
    pub fn hard(mut self) -> Self {
        self.hard = true;
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for DeleteRecord {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let _guard = ctx.lock_record(&self.directory_id, &self.id).await?;
            let mut record = ctx.read_record(&self.directory_id, &self.id).await?;

            if self.hard {
                ctx.delete_record_file(&self.directory_id, &self.id).await?;
                info!(record = %self.id, "record permanently deleted");
                return Ok(serde_json::json!({
                    "id": self.id,
                    "directoryId": self.directory_id,
                    "deleted": true,
                    "hard": true,
                }));
            }

            if record.is_deleted() {
                return Err(EngineError::RecordNotFound {
                    id: self.id.to_string(),
                });
            }
            record.deleted_at = Some(Utc::now());
            record.touch();
            ctx.write_record(&record).await?;

            info!(record = %self.id, version = record.version, "record deleted");
            Ok(serde_json::to_value(&record)?)
        }
        .await;

        logged(self, start, result)
    }

    /// A hard-deleted record has no log left to append to
    fn affected_records(&self, result: &Value) -> Vec<(DirectoryId, RecordId)> {
        if self.hard {
            Vec::new()
        } else {
            record_ref(result)
        }
    }
}
