//! ListRecords command

use super::query::{in_category, matches_search, search_fields, sort_records};
use super::record_view;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::{DirectoryId, Pagination, RecordStatus, SortOrder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// List records with filtering, free-text search, ordering and pagination
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecords {
    pub directory_id: DirectoryId,
    /// 1-based page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Category path prefix, as node ids or names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_path: Option<Vec<String>>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub expand: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
}

operation!(
    ListRecords,
    verb = "list",
    noun = "records",
    description = "List records in a directory"
);

impl ListRecords {
    pub fn new(directory_id: impl Into<DirectoryId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: usize, limit: usize) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_category_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_path = Some(path.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn sorted_by(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(key.into());
        self.sort_order = Some(order);
        self
    }

    pub fn expanded(mut self) -> Self {
        self.expand = true;
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
impl Execute<EngineContext, EngineError> for ListRecords {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let directory = ctx.read_directory(&self.directory_id).await?;
            let fields = ctx.fields(&self.directory_id).await?;
            let roles = self.roles.as_ref();

            let category_prefix = match self.category_path.as_deref() {
                Some(path) if !path.is_empty() => {
                    if !directory.supports_category {
                        return Err(EngineError::CategoriesDisabled {
                            directory: directory.id.to_string(),
                        });
                    }
                    let tree = ctx.read_category_tree(&directory.id).await?;
                    let nodes = tree.walk(path)?;
                    Some(nodes.iter().map(|n| n.id.to_string()).collect::<Vec<_>>())
                }
                _ => None,
            };
            let search = self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty());
            let searched = search_fields(&directory, &fields, roles);

            let mut records: Vec<_> = ctx
                .read_all_records(&self.directory_id)
                .await?
                .into_iter()
                .filter(|r| self.status.includes(r.is_deleted()))
                .filter(|r| category_prefix.as_deref().is_none_or(|p| in_category(r, p)))
                .filter(|r| search.is_none_or(|s| matches_search(ctx.registry(), r, &searched, s)))
                .collect();

            let (sort_by, sort_order) = match (&self.sort_by, &directory.config.default_sort) {
                (Some(by), _) => (by.as_str(), self.sort_order.unwrap_or_default()),
                (None, Some(default)) => (default.by.as_str(), self.sort_order.unwrap_or(default.order)),
                (None, None) => ("createdAt", self.sort_order.unwrap_or_default()),
            };
            sort_records(&mut records, sort_by, sort_order);

            let pagination = Pagination::new(
                self.page.unwrap_or(1).max(1),
                ctx.config().page_limit(self.limit),
                records.len(),
            );
            debug!(
                directory = %self.directory_id,
                total = pagination.total,
                page = pagination.page,
                "records listed"
            );

            let mut page = Vec::with_capacity(pagination.limit);
            for record in &records[pagination.range()] {
                page.push(record_view(ctx, &fields, record, roles, self.expand).await?);
            }

            Ok(serde_json::json!({
                "records": page,
                "pagination": pagination,
            }))
        }
        .await;

        unlogged(result)
    }
}
