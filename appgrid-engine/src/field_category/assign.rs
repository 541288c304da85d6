//! AssignFieldCategory command

use super::{attach_field, detach_field};
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::field::find_field;
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, FieldCategoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Move a field into a field category
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignFieldCategory {
    pub directory_id: DirectoryId,
    /// Field ULID or key
    pub field: String,
    pub category_id: FieldCategoryId,
}

operation!(
    AssignFieldCategory,
    verb = "assign",
    noun = "field category",
    description = "Move a field into a field category"
);

impl AssignFieldCategory {
    pub fn new(
        directory_id: impl Into<DirectoryId>,
        field: impl Into<String>,
        category_id: impl Into<FieldCategoryId>,
    ) -> Self {
        Self {
            directory_id: directory_id.into(),
            field: field.into(),
            category_id: category_id.into(),
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for AssignFieldCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let category = ctx
                .read_field_category(&self.directory_id, &self.category_id)
                .await?;
            let mut fields = ctx.fields(&self.directory_id).await?;
            let mut def = find_field(&fields, &self.field)?.clone();

            detach_field(ctx, &self.directory_id, &def.id.to_string()).await?;
            def.category_id = Some(self.category_id.to_string());
            fields.write_field(&def).await?;
            attach_field(ctx, category, &def).await?;

            Ok(serde_json::to_value(&def)?)
        }
        .await;

        logged(self, start, result)
    }
}
