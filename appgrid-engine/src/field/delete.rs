//! DeleteField command

use super::migrate::{apply_step, migrate_records, remember_failures};
use super::schema::find_field;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::field_category::detach_field;
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, MigrationReport, MigrationStep};
use appgrid_fields::FieldKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Delete a field definition and strip its key from every record
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteField {
    pub directory_id: DirectoryId,
    /// Field ULID or key
    pub field_id: String,
}

operation!(
    DeleteField,
    verb = "delete",
    noun = "field",
    description = "Delete a field and remove its values from all records"
);

impl DeleteField {
    pub fn new(directory_id: impl Into<DirectoryId>, field_id: impl Into<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            field_id: field_id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for DeleteField {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let mut fields = ctx.fields(&self.directory_id).await?;
            let def = find_field(&fields, &self.field_id)?.clone();

            let dependent = fields.all_fields().into_iter().find(|f| {
                f.lookup
                    .as_ref()
                    .and_then(|l| l.parts())
                    .is_some_and(|(rel, _)| rel == def.key)
            });
            if let Some(lookup) = dependent {
                return Err(EngineError::invalid_schema(
                    &def.key,
                    format!("lookup field '{}' reads through this relation", lookup.key),
                ));
            }

            fields.delete_field(&def.id).await?;
            detach_field(ctx, &self.directory_id, &def.id.to_string()).await?;

            let (report, pending) = if def.kind == FieldKind::Lookup {
                (MigrationReport::default(), None)
            } else {
                let step = MigrationStep::RemoveKey {
                    key: def.key.clone(),
                };
                let registry = ctx.registry();
                let report = migrate_records(ctx, &self.directory_id, |record| {
                    apply_step(&step, record, None, registry)
                })
                .await?;
                let pending = remember_failures(ctx, &self.directory_id, step, &report).await?;
                (report, pending)
            };
            report.warn_if_partial("delete field", self.directory_id.as_str());

            info!(
                directory = %self.directory_id,
                key = %def.key,
                removed = report.succeeded,
                "field deleted"
            );
            Ok(serde_json::json!({
                "id": def.id.to_string(),
                "key": def.key,
                "removedFromRecords": report.succeeded,
                "migration": report,
                "pendingMigration": pending,
            }))
        }
        .await;

        logged(self, start, result)
    }
}
