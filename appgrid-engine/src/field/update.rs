//! UpdateField command

use super::migrate::{apply_step, migrate_records, remember_failures};
use super::schema::{check_definition, find_field};
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult};
use crate::types::{DirectoryId, MigrationStep};
use appgrid_fields::{FieldDef, FieldKind, LookupConfig, RelationConfig, SelectOption, Validators};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::info;

/// Partial update of a field definition. `None` leaves a property unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    pub key: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub options: Option<Vec<SelectOption>>,
    pub schema: Option<Value>,
    pub relation: Option<RelationConfig>,
    pub lookup: Option<LookupConfig>,
    pub validators: Option<Validators>,
    pub required: Option<bool>,
    pub read_roles: Option<BTreeSet<String>>,
    pub write_roles: Option<BTreeSet<String>>,
    pub order: Option<i32>,
    pub default: Option<Value>,
    pub searchable: Option<bool>,
}

impl FieldPatch {
    fn apply(&self, def: &mut FieldDef) {
        if let Some(key) = &self.key {
            def.key = key.clone();
        }
        if let Some(label) = &self.label {
            def.label = Some(label.clone());
        }
        if let Some(description) = &self.description {
            def.description = Some(description.clone());
        }
        if let Some(type_) = &self.type_ {
            def.type_ = type_.clone();
            def.kind = FieldKind::for_type(type_);
        }
        if let Some(options) = &self.options {
            def.options = options.clone();
        }
        if let Some(schema) = &self.schema {
            def.schema = Some(schema.clone());
        }
        if let Some(relation) = &self.relation {
            def.relation = Some(relation.clone());
        }
        if let Some(lookup) = &self.lookup {
            def.lookup = Some(lookup.clone());
        }
        if let Some(validators) = &self.validators {
            def.validators = validators.clone();
        }
        if let Some(required) = self.required {
            def.required = required;
        }
        if let Some(roles) = &self.read_roles {
            def.read_roles = roles.clone();
        }
        if let Some(roles) = &self.write_roles {
            def.write_roles = roles.clone();
        }
        if let Some(order) = self.order {
            def.order = order;
        }
        if let Some(default) = &self.default {
            def.default = Some(default.clone());
        }
        if let Some(searchable) = self.searchable {
            def.searchable = searchable;
        }
    }
}

/// Update a field definition, migrating record values on rename or type change
///
/// A key rename moves each record's value to the new key. A type change
/// coerces each stored value, replacing what cannot be converted with the
/// new type's zero value. Both are best-effort batches; the result carries a
/// migration report listing any record that could not be rewritten.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateField {
    pub directory_id: DirectoryId,
    /// Field ULID or key
    pub field_id: String,
    pub patch: FieldPatch,
}

operation!(
    UpdateField,
    verb = "update",
    noun = "field",
    description = "Update a field definition"
);

impl UpdateField {
    pub fn new(directory_id: impl Into<DirectoryId>, field_id: impl Into<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            field_id: field_id.into(),
            patch: FieldPatch::default(),
        }
    }

    pub fn with_patch(mut self, patch: FieldPatch) -> Self {
        self.patch = patch;
        self
    }

    /// Rename the field's key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.patch.key = Some(key.into());
        self
    }

    /// Change the field's type
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.patch.type_ = Some(type_.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.patch.label = Some(label.into());
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.patch.options = Some(options);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.patch.required = Some(required);
        self
    }
}

#[async_trait]
impl Execute<EngineContext, EngineError> for UpdateField {
    async fn execute(&self, ctx: &EngineContext) -> ExecutionResult<Value, EngineError> {
        let start = std::time::Instant::now();

        let result: Result<Value> = async {
            let mut fields = ctx.fields(&self.directory_id).await?;
            let current = find_field(&fields, &self.field_id)?.clone();

            let mut def = current.clone();
            self.patch.apply(&mut def);

            let renamed = def.key != current.key;
            let retyped = def.type_ != current.type_;
            if renamed && fields.get_field_by_key(&def.key).is_some() {
                return Err(EngineError::DuplicateKey { key: def.key });
            }

            check_definition(ctx, &fields, &def).await?;
            fields.write_field(&def).await?;

            // Lookups reading through a renamed relation follow it
            if renamed && current.relation.is_some() {
                let dependents: Vec<FieldDef> = fields
                    .all_fields()
                    .into_iter()
                    .filter(|f| {
                        f.lookup
                            .as_ref()
                            .and_then(|l| l.parts())
                            .is_some_and(|(rel, _)| rel == current.key)
                    })
                    .cloned()
                    .collect();
                for mut lookup in dependents {
                    let target_key = lookup
                        .lookup
                        .as_ref()
                        .and_then(|l| l.parts())
                        .map(|(_, key)| key.to_string());
                    if let Some(target_key) = target_key {
                        lookup.lookup = Some(LookupConfig {
                            source: format!("{}.{}", def.key, target_key),
                        });
                        fields.write_field(&lookup).await?;
                    }
                }
            }

            let stores_values = current.kind != FieldKind::Lookup && def.kind != FieldKind::Lookup;
            let (migration, pending) = if (renamed || retyped) && stores_values {
                let step = MigrationStep::MoveValue {
                    field_id: def.id.to_string(),
                    from: current.key.clone(),
                    retype: retyped,
                };
                let registry = ctx.registry();
                let report = migrate_records(ctx, &self.directory_id, |record| {
                    apply_step(&step, record, Some(&def), registry)
                })
                .await?;
                report.warn_if_partial("update field", self.directory_id.as_str());
                let pending = remember_failures(ctx, &self.directory_id, step, &report).await?;
                (Some(report), pending)
            } else {
                (None, None)
            };

            info!(
                directory = %self.directory_id,
                key = %def.key,
                renamed,
                retyped,
                "field updated"
            );
            Ok(serde_json::json!({
                "field": def,
                "migration": migration,
                "pendingMigration": pending,
            }))
        }
        .await;

        logged(self, start, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CreateDirectory;
    use crate::field::CreateField;
    use crate::record::{CreateRecord, GetRecord};
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, EngineContext, String) {
        let temp = TempDir::new().unwrap();
        let ctx = EngineContext::new(temp.path());
        let dir = CreateDirectory::new("app", "m", "Items")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        (temp, ctx, dir)
    }

    async fn field(ctx: &EngineContext, dir: &str, def: FieldDef) {
        CreateField::new(dir, def)
            .execute(ctx)
            .await
            .into_result()
            .unwrap();
    }

    async fn record(ctx: &EngineContext, dir: &str, props: Value) -> String {
        CreateRecord::new(dir, props.as_object().unwrap().clone())
            .execute(ctx)
            .await
            .into_result()
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn props(ctx: &EngineContext, dir: &str, id: &str) -> Value {
        GetRecord::new(dir, id)
            .execute(ctx)
            .await
            .into_result()
            .unwrap()["props"]
            .clone()
    }

    #[tokio::test]
    async fn test_rename_moves_values() {
        let (_temp, ctx, dir) = setup().await;
        field(&ctx, &dir, FieldDef::new("oldKey", "text")).await;
        let id = record(&ctx, &dir, json!({"oldKey": "x"})).await;
        let untouched = record(&ctx, &dir, json!({})).await;

        let result = UpdateField::new(dir.as_str(), "oldKey")
            .with_key("newKey")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result["field"]["key"], "newKey");
        assert_eq!(result["migration"]["succeeded"], 1);
        assert_eq!(result["migration"]["skipped"], 1);
        assert_eq!(props(&ctx, &dir, &id).await, json!({"newKey": "x"}));
        assert_eq!(props(&ctx, &dir, &untouched).await, json!({}));

        // Rerunning the migration finds nothing left to move
        let again = UpdateField::new(dir.as_str(), "newKey")
            .with_type("textarea")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(again["migration"]["failed"], 0);
    }

    #[tokio::test]
    async fn test_type_change_coerces_values() {
        let (_temp, ctx, dir) = setup().await;
        field(&ctx, &dir, FieldDef::new("qty", "text")).await;
        let good = record(&ctx, &dir, json!({"qty": "42"})).await;
        let bad = record(&ctx, &dir, json!({"qty": "many"})).await;

        let result = UpdateField::new(dir.as_str(), "qty")
            .with_type("number")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result["field"]["type"], "number");
        assert_eq!(result["migration"]["succeeded"], 2);
        assert_eq!(props(&ctx, &dir, &good).await["qty"], 42);
        assert_eq!(props(&ctx, &dir, &bad).await["qty"], 0);
    }

    #[tokio::test]
    async fn test_select_to_multiselect() {
        let (_temp, ctx, dir) = setup().await;
        let options = vec![SelectOption::new("a"), SelectOption::new("b")];
        field(&ctx, &dir, FieldDef::new("pick", "select").with_options(options)).await;
        let id = record(&ctx, &dir, json!({"pick": "a"})).await;

        UpdateField::new(dir.as_str(), "pick")
            .with_type("multiselect")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(props(&ctx, &dir, &id).await["pick"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_rename_to_existing_key_rejected() {
        let (_temp, ctx, dir) = setup().await;
        field(&ctx, &dir, FieldDef::new("a", "text")).await;
        field(&ctx, &dir, FieldDef::new("b", "text")).await;

        let result = UpdateField::new(dir.as_str(), "a")
            .with_key("b")
            .execute(&ctx)
            .await
            .into_result();
        assert!(matches!(result, Err(EngineError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn test_label_change_has_no_migration() {
        let (_temp, ctx, dir) = setup().await;
        field(&ctx, &dir, FieldDef::new("name", "text")).await;

        let result = UpdateField::new(dir.as_str(), "name")
            .with_label("Full name")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(result["field"]["label"], "Full name");
        assert!(result["migration"].is_null());
    }
}
