//! CreateField command

use super::schema::check_definition;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::field_category::{attach_field, general_category};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, FieldCategoryId};
use appgrid_fields::{FieldDef, FieldKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use ulid::Ulid;

/// Add a field definition to a directory
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateField {
    pub directory_id: DirectoryId,
    pub field: FieldDef,
}

operation!(
    CreateField,
    verb = "create",
    noun = "field",
    description = "Define a new field on a directory"
);

impl CreateField {
    pub fn new(directory_id: impl Into<DirectoryId>, field: FieldDef) -> Self {
        Self {
            directory_id: directory_id.into(),
            field,
        }
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for CreateField {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let mut fields = ctx.fields(&self.directory_id).await?;

            let mut def = self.field.clone();
            def.directory_id = self.directory_id.to_string();
            def.kind = FieldKind::for_type(&def.type_);
            if fields.get_field_by_id(&def.id).is_some() {
                def.id = Ulid::new();
            }
            if fields.get_field_by_key(&def.key).is_some() {
                return Err(EngineError::DuplicateKey { key: def.key });
            }

            check_definition(ctx, &fields, &def).await?;

            let category = match &def.category_id {
                Some(id) => {
                    ctx.read_field_category(&self.directory_id, &FieldCategoryId::from(id))
                        .await?
                }
                None => general_category(ctx, &self.directory_id).await?,
            };
            def.category_id = Some(category.id.to_string());

            fields.create_field(&def).await?;
            attach_field(ctx, category, &def).await?;

            info!(directory = %self.directory_id, key = %def.key, type_ = %def.type_, "field created");
            Ok(serde_json::to_value(&def)?)
        }
        .await;

        logged(self, start, result)
    }
}
