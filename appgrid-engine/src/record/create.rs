//! CreateRecord command

use super::record_view;
use super::validate::{validate_write, WriteMode};
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, record_ref, Execute, ExecutionResult};
use crate::types::{DirectoryId, Props, Record, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::info;

/// Create a record
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecord {
    pub directory_id: DirectoryId,
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Caller roles for field-level write checks; `None` skips them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
}

operation!(
    CreateRecord,
    verb = "create",
    noun = "record",
    description = "Create a record in a directory"
);

impl CreateRecord {
    pub fn new(directory_id: impl Into<DirectoryId>, props: Map<String, Value>) -> Self {
        Self {
            directory_id: directory_id.into(),
            props,
            roles: None,
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for CreateRecord {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let directory = ctx.read_directory(&self.directory_id).await?;
            let fields = ctx.fields(&self.directory_id).await?;
            let write = validate_write(
                ctx,
                &directory,
                &fields,
                &self.props,
                WriteMode::Create,
                self.roles.as_ref(),
            )
            .await?;

            let mut record = Record::new(self.directory_id.clone(), Props::new());
            write.apply(&mut record.props);
            ctx.write_record(&record).await?;

            info!(directory = %record.directory_id, record = %record.id, "record created");
            record_view(ctx, &fields, &record, self.roles.as_ref(), false).await
        }
        .await;

        logged(self, start, result)
    }

    fn affected_records(&self, result: &Value) -> Vec<(DirectoryId, RecordId)> {
        record_ref(result)
    }
}
