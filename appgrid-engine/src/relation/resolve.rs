//! ResolveRelation command

use super::RelationResolver;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::field::find_field;
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::DirectoryId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resolve a raw relation value to target records or display values
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRelation {
    pub directory_id: DirectoryId,
    /// Relation field ULID or key
    pub field: String,
    /// One id or a list of ids
    pub value: Value,
}

operation!(
    ResolveRelation,
    verb = "resolve",
    noun = "relation",
    description = "Resolve relation ids to their target records"
);

impl ResolveRelation {
    pub fn new(directory_id: impl Into<DirectoryId>, field: impl Into<String>, value: Value) -> Self {
        Self {
            directory_id: directory_id.into(),
            field: field.into(),
            value,
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for ResolveRelation {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let fields = ctx.fields(&self.directory_id).await?;
            let field = find_field(&fields, &self.field)?;
            if field.relation.is_none() {
                return Err(EngineError::invalid_schema(&field.key, "field is not a relation"));
            }
            let registry = ctx.registry();
            registry
                .validate(field, Some(&self.value))
                .map_err(|e| EngineError::validation(&field.key, e))?;
            let raw = registry.transform(field, &self.value);

            RelationResolver::new(ctx).resolve(field, &raw).await
        }
        .await;

        unlogged(result)
    }
}
