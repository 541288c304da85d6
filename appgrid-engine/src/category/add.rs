//! AddCategory command

use super::category_directory;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{CategoryId, DirectoryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Add a category node, as a root or under a parent
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCategory {
    pub directory_id: DirectoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    pub name: String,
}

operation!(
    AddCategory,
    verb = "add",
    noun = "category",
    description = "Add a node to a record category tree"
);

impl AddCategory {
    pub fn new(directory_id: impl Into<DirectoryId>, name: impl Into<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            parent_id: None,
            name: name.into(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<CategoryId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for AddCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            category_directory(ctx, &self.directory_id).await?;
            let mut tree = ctx.read_category_tree(&self.directory_id).await?;
            let id = tree.add(self.parent_id.as_ref(), &self.name)?;
            ctx.write_category_tree(&self.directory_id, &tree).await?;

            let depth = tree.find(&id).map(|(_, depth)| depth).unwrap_or_default();
            Ok(serde_json::json!({
                "id": id,
                "name": self.name.trim(),
                "parentId": self.parent_id,
                "depth": depth,
            }))
        }
        .await;

        logged(self, start, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::GetCategoryTree;
    use crate::directory::CreateDirectory;
    use tempfile::TempDir;

    async fn run<O: Execute<EngineContext, EngineError>>(ctx: &EngineContext, op: O) -> Result<Value> {
        op.execute(ctx).await.into_result()
    }

    #[tokio::test]
    async fn test_fourth_level_rejected() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = run(&ctx, CreateDirectory::new("app", "m", "Docs").with_categories())
            .await
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        let mut parent: Option<String> = None;
        for name in ["L1", "L2", "L3"] {
            let mut op = AddCategory::new(dir.as_str(), name);
            if let Some(p) = &parent {
                op = op.with_parent(p.as_str());
            }
            let added = run(&ctx, op).await.unwrap();
            parent = Some(added["id"].as_str().unwrap().to_string());
        }

        let fourth = AddCategory::new(dir.as_str(), "L4").with_parent(parent.unwrap().as_str());
        assert!(matches!(
            run(&ctx, fourth).await,
            Err(EngineError::CategoryDepthExceeded { max: 3 })
        ));

        let tree = run(&ctx, GetCategoryTree::new(dir.as_str())).await.unwrap();
        assert_eq!(tree["roots"][0]["children"][0]["children"][0]["name"], "L3");
        assert!(tree["roots"][0]["children"][0]["children"][0]["children"]
            .as_array()
            .is_none_or(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_disabled_directory() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = run(&ctx, CreateDirectory::new("app", "m", "Flat"))
            .await
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(matches!(
            run(&ctx, AddCategory::new(dir.as_str(), "X")).await,
            Err(EngineError::CategoriesDisabled { .. })
        ));
    }
}
