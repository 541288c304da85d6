//! UpdateRecord command

use super::record_view;
use super::validate::{validate_write, WriteMode};
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, record_ref, Execute, ExecutionResult};
use crate::types::{DirectoryId, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Partially update a record, conditional on its version
///
/// Only the supplied keys are validated and merged; a null value removes the
/// key. The write succeeds only if the stored version still equals
/// `expected_version`, and bumps it by one.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub directory_id: DirectoryId,
    pub id: RecordId,
    #[serde(default)]
    pub props: Map<String, Value>,
    pub expected_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
}

operation!(
    UpdateRecord,
    verb = "update",
    noun = "record",
    description = "Update a record if its version matches"
);

impl UpdateRecord {
    pub fn new(
        directory_id: impl Into<DirectoryId>,
        id: impl Into<RecordId>,
        expected_version: u64,
    ) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
            props: Map::new(),
            expected_version,
            roles: None,
        }
    }

    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        self.props = props;
        self
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
impl Execute<EngineContext, EngineError> for UpdateRecord {
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
                WriteMode::Update,
                self.roles.as_ref(),
            )
            .await?;

            let _guard = ctx.lock_record(&self.directory_id, &self.id).await?;
            let mut record = ctx.read_record(&self.directory_id, &self.id).await?;
            if record.is_deleted() {
                return Err(EngineError::RecordNotFound {
                    id: self.id.to_string(),
                });
            }
            if record.version != self.expected_version {
                debug!(
                    record = %self.id,
                    expected = self.expected_version,
                    actual = record.version,
                    "version conflict"
                );
                return Err(EngineError::Conflict {
                    id: self.id.to_string(),
                    expected: self.expected_version,
                    actual: record.version,
                });
            }

            write.apply(&mut record.props);
            record.touch();
            ctx.write_record(&record).await?;

            info!(record = %record.id, version = record.version, "record updated");
            record_view(ctx, &fields, &record, self.roles.as_ref(), false).await
        }
        .await;

        logged(self, start, result)
    }

    fn affected_records(&self, result: &Value) -> Vec<(DirectoryId, RecordId)> {
        record_ref(result)
    }
}
