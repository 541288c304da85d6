//! RelationResolver: read-only projection of related records

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::types::{DirectoryId, Record, RecordId};
use appgrid_fields::{FieldDef, FieldKind, FieldsContext, RelationConfig, RelationMode, Value};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

/// Resolves relation and lookup values against target directories.
///
/// Never writes. Missing and soft-deleted targets are skipped.
pub struct RelationResolver<'a> {
    ctx: &'a EngineContext,
}

impl<'a> RelationResolver<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self { ctx }
    }

    /// Live target records for `ids`, in the order given.
    pub async fn targets(&self, relation: &RelationConfig, ids: &[String]) -> Result<Vec<Record>> {
        let target = DirectoryId::from(relation.target_directory_id.as_str());
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.ctx.read_record(&target, &RecordId::from(id.as_str())).await {
                Ok(record) if !record.is_deleted() => records.push(record),
                Ok(_) | Err(EngineError::RecordNotFound { .. }) => {
                    debug!(directory = %target, record = %id, "relation target missing, skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Ids in `ids` with no live record in the relation's target directory.
    pub async fn missing_ids(&self, relation: &RelationConfig, ids: &[String]) -> Result<Vec<String>> {
        let target = DirectoryId::from(relation.target_directory_id.as_str());
        if !self.ctx.directory_exists(&target) {
            return Err(EngineError::DirectoryNotFound {
                id: target.to_string(),
            });
        }
        let found = self.targets(relation, ids).await?;
        Ok(ids
            .iter()
            .filter(|id| !found.iter().any(|r| r.id.as_str() == id.as_str()))
            .cloned()
            .collect())
    }

    /// Resolve a stored relation value.
    ///
    /// `relation_many` yields an array in stored order; `relation_one` yields
    /// one projection or null. With a display field set, each target is
    /// projected to that field's value instead of the full record.
    pub async fn resolve(&self, field: &FieldDef, raw: &Value) -> Result<JsonValue> {
        let relation = field.relation.as_ref().ok_or_else(|| {
            EngineError::invalid_schema(&field.key, "field is not a relation")
        })?;
        let targets = self.targets(relation, &raw.ids()).await?;
        let project = |record: &Record| -> Result<JsonValue> {
            match &relation.display_field_key {
                Some(key) => Ok(record.get(key).map(Value::to_json).unwrap_or(JsonValue::Null)),
                None => Ok(serde_json::to_value(record)?),
            }
        };

        match relation.mode {
            RelationMode::One => match targets.first() {
                Some(record) => project(record),
                None => Ok(JsonValue::Null),
            },
            RelationMode::Many => Ok(JsonValue::Array(
                targets.iter().map(project).collect::<Result<Vec<_>>>()?,
            )),
        }
    }

    /// Compute a lookup value by following its relation on `record`.
    pub async fn lookup(
        &self,
        fields: &FieldsContext,
        field: &FieldDef,
        record: &Record,
    ) -> Result<JsonValue> {
        let Some((relation_key, target_key)) = field.lookup.as_ref().and_then(|l| l.parts()) else {
            return Ok(JsonValue::Null);
        };
        let Some(relation) = fields
            .get_field_by_key(relation_key)
            .and_then(|f| f.relation.as_ref())
        else {
            return Ok(JsonValue::Null);
        };
        let ids = record.get(relation_key).map(Value::ids).unwrap_or_default();
        let values: Vec<JsonValue> = self
            .targets(relation, &ids)
            .await?
            .iter()
            .map(|r| r.get(target_key).map(Value::to_json).unwrap_or(JsonValue::Null))
            .collect();

        Ok(match relation.mode {
            RelationMode::One => values.into_iter().next().unwrap_or(JsonValue::Null),
            RelationMode::Many => JsonValue::Array(values),
        })
    }

    /// Resolved relation and lookup values of a record, keyed by field key.
    pub async fn expand(
        &self,
        fields: &FieldsContext,
        record: &Record,
        visible: impl Fn(&FieldDef) -> bool,
    ) -> Result<Map<String, JsonValue>> {
        let mut expanded = Map::new();
        for field in fields.all_fields() {
            if !visible(field) {
                continue;
            }
            match field.kind {
                FieldKind::Relation => {
                    if let Some(raw) = record.get(&field.key) {
                        expanded.insert(field.key.clone(), self.resolve(field, raw).await?);
                    }
                }
                FieldKind::Lookup => {
                    expanded.insert(field.key.clone(), self.lookup(fields, field, record).await?);
                }
                FieldKind::Primitive | FieldKind::Composite => {}
            }
        }
        Ok(expanded)
    }
}
