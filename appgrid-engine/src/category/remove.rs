//! RemoveCategory command

use super::category_directory;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::field::{apply_step, migrate_records, remember_failures};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{CategoryId, CategoryNode, DirectoryId, MigrationStep};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Remove a category node with its subtree
///
/// Records assigned anywhere inside the removed subtree lose their category.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCategory {
    pub directory_id: DirectoryId,
    pub id: CategoryId,
}

operation!(
    RemoveCategory,
    verb = "remove",
    noun = "category",
    description = "Remove a record category and its children"
);

impl RemoveCategory {
    pub fn new(directory_id: impl Into<DirectoryId>, id: impl Into<CategoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
        }
    }
}

fn subtree_ids(node: &CategoryNode, ids: &mut HashSet<String>) {
    ids.insert(node.id.to_string());
    for child in &node.children {
        subtree_ids(child, ids);
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for RemoveCategory {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            category_directory(ctx, &self.directory_id).await?;
            let mut tree = ctx.read_category_tree(&self.directory_id).await?;
            let removed = tree.remove(&self.id)?;
            ctx.write_category_tree(&self.directory_id, &tree).await?;

            let mut ids = HashSet::new();
            subtree_ids(&removed, &mut ids);
            let mut nodes: Vec<String> = ids.into_iter().collect();
            nodes.sort();
            let removed_count = nodes.len();
            let step = MigrationStep::ClearCategory { nodes };
            let registry = ctx.registry();
            let report = migrate_records(ctx, &self.directory_id, |record| {
                apply_step(&step, record, None, registry)
            })
            .await?;
            report.warn_if_partial("remove category", self.directory_id.as_str());
            let pending = remember_failures(ctx, &self.directory_id, step, &report).await?;

            Ok(serde_json::json!({
                "id": self.id,
                "removed": removed_count,
                "migration": report,
                "pendingMigration": pending,
            }))
        }
        .await;

        logged(self, start, result)
    }
}
