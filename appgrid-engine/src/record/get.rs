//! GetRecord command

use super::record_view;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::{DirectoryId, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Get a record by id
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecord {
    pub directory_id: DirectoryId,
    pub id: RecordId,
    /// Attach resolved relation and lookup values under `expanded`
    #[serde(default)]
    pub expand: bool,
    /// Return the record even if soft-deleted
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
}

operation!(
    GetRecord,
    verb = "get",
    noun = "record",
    description = "Retrieve a record by id"
);

impl GetRecord {
    pub fn new(directory_id: impl Into<DirectoryId>, id: impl Into<RecordId>) -> Self {
        Self {
            directory_id: directory_id.into(),
            id: id.into(),
            expand: false,
            include_deleted: false,
            roles: None,
        }
    }

    pub fn expanded(mut self) -> Self {
        self.expand = true;
        self
    }

    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
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
impl Execute<EngineContext, EngineError> for GetRecord {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let result: Result<Value> = async {
            let fields = ctx.fields(&self.directory_id).await?;
            let record = ctx.read_record(&self.directory_id, &self.id).await?;
            if record.is_deleted() && !self.include_deleted {
                return Err(EngineError::RecordNotFound {
                    id: self.id.to_string(),
                });
            }
            record_view(ctx, &fields, &record, self.roles.as_ref(), self.expand).await
        }
        .await;

        unlogged(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CreateDirectory;
    use crate::field::CreateField;
    use crate::record::{CreateRecord, DeleteRecord};
    use appgrid_fields::FieldDef;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    async fn run<O: Execute<EngineContext, EngineError>>(ctx: &EngineContext, op: O) -> Value {
        op.execute(ctx).await.into_result().unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_primitives() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = run(&ctx, CreateDirectory::new("app", "m", "People")).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        for def in [
            FieldDef::new("name", "text"),
            FieldDef::new("bio", "textarea"),
            FieldDef::new("email", "email"),
            FieldDef::new("age", "number"),
            FieldDef::new("active", "boolean"),
            FieldDef::new("born", "date"),
        ] {
            run(&ctx, CreateField::new(dir.as_str(), def)).await;
        }

        let props = json!({
            "name": "Alice",
            "bio": "line one\nline two",
            "email": "alice@example.com",
            "age": 36,
            "active": true,
            "born": "1990-05-01",
        });
        let created = run(&ctx, CreateRecord::new(dir.as_str(), props.as_object().unwrap().clone())).await;
        let id = created["id"].as_str().unwrap();

        let fetched = run(&ctx, GetRecord::new(dir.as_str(), id)).await;
        assert_eq!(fetched["props"], props);
        assert_eq!(fetched["version"], 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_hidden_by_default() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = run(&ctx, CreateDirectory::new("app", "m", "Notes")).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        let id = run(&ctx, CreateRecord::new(dir.as_str(), Map::new())).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        run(&ctx, DeleteRecord::new(dir.as_str(), id.as_str())).await;

        let hidden = GetRecord::new(dir.as_str(), id.as_str())
            .execute(&ctx)
            .await
            .into_result();
        assert!(matches!(hidden, Err(EngineError::RecordNotFound { .. })));

        let shown = run(&ctx, GetRecord::new(dir.as_str(), id.as_str()).including_deleted()).await;
        assert!(shown["deletedAt"].is_string());
    }

    #[tokio::test]
    async fn test_read_roles_hide_props() {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = run(&ctx, CreateDirectory::new("app", "m", "Staff")).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("name", "text"))).await;
        run(
            &ctx,
            CreateField::new(dir.as_str(), FieldDef::new("salary", "number").with_read_roles(["hr"])),
        )
        .await;
        let props = json!({"name": "Eve", "salary": 100});
        let id = run(&ctx, CreateRecord::new(dir.as_str(), props.as_object().unwrap().clone()))
            .await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let sales = run(&ctx, GetRecord::new(dir.as_str(), id.as_str()).with_roles(["sales"])).await;
        assert_eq!(sales["props"], json!({"name": "Eve"}));
        let hr = run(&ctx, GetRecord::new(dir.as_str(), id.as_str()).with_roles(["hr"])).await;
        assert_eq!(hr["props"]["salary"], 100);
        let anyone = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
        assert_eq!(anyone["props"]["salary"], 100);
    }
}
