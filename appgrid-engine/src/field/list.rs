//! ListFields command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::{DirectoryId, FieldCategoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List a directory's field definitions in display order
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFields {
    pub directory_id: DirectoryId,
    /// Only fields grouped under this field category
    pub category_id: Option<FieldCategoryId>,
}

operation!(
    ListFields,
    verb = "list",
    noun = "fields",
    description = "List field definitions of a directory"
);

impl ListFields {
    pub fn new(directory_id: impl Into<DirectoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: impl Into<FieldCategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for ListFields {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let fields = ctx.fields(&self.directory_id).await?;
            let selected: Vec<_> = fields
                .all_fields()
                .into_iter()
                .filter(|f| {
                    self.category_id
                        .as_ref()
                        .is_none_or(|c| f.category_id.as_deref() == Some(c.as_str()))
                })
                .collect();

            Ok(serde_json::json!({
                "count": selected.len(),
                "fields": selected,
            }))
        }
        .await;

        unlogged(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CreateDirectory;
    use crate::field::{CreateField, GetField};
    use appgrid_fields::FieldDef;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_and_get_fields() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = CreateDirectory::new("app", "m", "People")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        let mut age = FieldDef::new("age", "number");
        age.order = 2;
        for def in [age, FieldDef::new("name", "text")] {
            CreateField::new(dir.as_str(), def)
                .execute(&ctx)
                .await
                .into_result()
                .unwrap();
        }

        let result = ListFields::new(dir.as_str())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(result["count"], 2);
        assert_eq!(result["fields"][0]["key"], "name");
        assert_eq!(result["fields"][1]["key"], "age");

        let by_key = GetField::new(dir.as_str(), "age")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        let by_id = GetField::new(dir.as_str(), by_key["id"].as_str().unwrap())
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(by_id["key"], "age");

        let missing = GetField::new(dir.as_str(), "nope").execute(&ctx).await.into_result();
        assert!(matches!(missing, Err(EngineError::FieldNotFound { .. })));
    }
}
