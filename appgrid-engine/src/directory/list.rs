//! ListDirectories command

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List directories, optionally within one application or module
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDirectories {
    pub application_id: Option<String>,
    pub module_id: Option<String>,
}

operation!(
    ListDirectories,
    verb = "list",
    noun = "directories",
    description = "List directories ordered by position then name"
);

impl ListDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_application(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn in_module(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = Some(module_id.into());
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for ListDirectories {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let mut directories: Vec<_> = ctx
                .read_all_directories()
                .await?
                .into_iter()
                .filter(|d| {
                    self.application_id
                        .as_ref()
                        .is_none_or(|app| &d.application_id == app)
                })
                .filter(|d| self.module_id.as_ref().is_none_or(|m| &d.module_id == m))
                .collect();
            directories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

            Ok(serde_json::json!({
                "count": directories.len(),
                "directories": directories,
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
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());

        for (app, name, order) in [("a", "Zeta", 0), ("a", "Alpha", 1), ("a", "Beta", 0), ("b", "Other", 0)] {
            CreateDirectory::new(app, "m", name)
                .with_order(order)
                .execute(&ctx)
                .await
                .into_result()
                .unwrap();
        }

        let result = ListDirectories::new()
            .in_application("a")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result["count"], 3);
        let names: Vec<&str> = result["directories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Beta", "Zeta", "Alpha"]);
    }
}
