//! RestoreRecord command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, record_ref, Execute, ExecutionResult};
use crate::types::{DirectoryId, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Bring back a soft-deleted record
///
/// Restoring a record that is not deleted changes nothing.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRecord {
    pub directory_id: DirectoryId,
    pub id: RecordId,
}

operation!(
    RestoreRecord,
    verb = "restore",
    noun = "record",
    description = "Restore a soft-deleted record"
);

impl RestoreRecord {
    pub fn new(directory_id: impl Into<DirectoryId>, id: impl Into<RecordId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for RestoreRecord {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let _guard = ctx.lock_record(&self.directory_id, &self.id).await?;
            let mut record = ctx.read_record(&self.directory_id, &self.id).await?;
            if record.is_deleted() {
                record.deleted_at = None;
                record.touch();
                ctx.write_record(&record).await?;
                info!(record = %self.id, version = record.version, "record restored");
            }
            Ok(serde_json::to_value(&record)?)
        }
        .await;

        logged(self, start, result)
    }

    fn affected_records(&self, result: &Value) -> Vec<(DirectoryId, RecordId)> {
        record_ref(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CreateDirectory;
    use crate::record::{CreateRecord, DeleteRecord, GetRecord};
    use serde_json::Map;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restore_round_trip() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = CreateDirectory::new("app", "m", "Notes")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        let id = CreateRecord::new(dir.as_str(), Map::new())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        DeleteRecord::new(dir.as_str(), id.as_str())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        let restored = RestoreRecord::new(dir.as_str(), id.as_str())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert!(restored.get("deletedAt").is_none());
        assert_eq!(restored["version"], 3);

        // Already active: unchanged
        let again = RestoreRecord::new(dir.as_str(), id.as_str())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(again["version"], 3);

        let fetched = GetRecord::new(dir.as_str(), id.as_str())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(fetched["version"], 3);
    }
}
