//! RetryMigration and ListMigrations commands

use super::migrate::{apply_step, migrate_ids};
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, unlogged, Execute, ExecutionResult};
use crate::types::{DirectoryId, MigrationStep};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use ulid::Ulid;

/// Rewrite the records a schema migration left behind
///
/// Each pending migration is replayed against its recorded ids only. Records
/// that still fail stay pending; a fully applied migration is dropped.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryMigration {
    pub directory_id: DirectoryId,
    /// Only this pending migration; all of them when unset
    pub id: Option<String>,
}

operation!(
    RetryMigration,
    verb = "retry",
    noun = "migration",
    description = "Retry records an earlier schema migration could not rewrite"
);

impl RetryMigration {
    pub fn new(directory_id: impl Into<DirectoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for RetryMigration {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let fields = ctx.fields(&self.directory_id).await?;
            let registry = ctx.registry();
            let pending = ctx.read_pending_migrations(&self.directory_id).await?;
            if let Some(id) = &self.id {
                if !pending.iter().any(|p| &p.id == id) {
                    return Err(EngineError::MigrationNotFound { id: id.clone() });
                }
            }

            let mut outcomes = Vec::new();
            let mut remaining = Vec::new();
            for mut migration in pending {
                if self.id.as_ref().is_some_and(|id| id != &migration.id) {
                    remaining.push(migration);
                    continue;
                }

                // Moved values land in the field as it is now
                let target = match &migration.step {
                    MigrationStep::MoveValue { field_id, .. } => Ulid::from_string(field_id)
                        .ok()
                        .and_then(|id| fields.get_field_by_id(&id)),
                    _ => None,
                };
                let report = migrate_ids(
                    ctx,
                    &self.directory_id,
                    migration.record_ids.clone(),
                    |record| apply_step(&migration.step, record, target, registry),
                )
                .await?;
                report.warn_if_partial("retry migration", self.directory_id.as_str());

                outcomes.push(serde_json::json!({
                    "id": migration.id,
                    "step": migration.step,
                    "migration": report,
                }));
                if !report.is_complete() {
                    migration.record_ids = report.failed_ids;
                    remaining.push(migration);
                }
            }
            ctx.write_pending_migrations(&self.directory_id, &remaining)
                .await?;

            info!(
                directory = %self.directory_id,
                retried = outcomes.len(),
                remaining = remaining.len(),
                "pending migrations retried"
            );
            Ok(serde_json::json!({
                "retried": outcomes.len(),
                "migrations": outcomes,
                "remaining": remaining.len(),
            }))
        }
        .await;

        logged(self, start, result)
    }
}

/// List migrations that still have records to rewrite
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMigrations {
    pub directory_id: DirectoryId,
}

operation!(
    ListMigrations,
    verb = "list",
    noun = "migrations",
    description = "List incomplete schema migrations of a directory"
);

impl ListMigrations {
    pub fn new(directory_id: impl Into<DirectoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for ListMigrations {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            ctx.read_directory(&self.directory_id).await?;
            let pending = ctx.read_pending_migrations(&self.directory_id).await?;
            Ok(serde_json::json!({
                "count": pending.len(),
                "migrations": pending,
            }))
        }
        .await;

        unlogged(result)
    }
}
