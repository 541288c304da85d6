//! Definition-time checks that need more than the field itself

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::types::DirectoryId;
use appgrid_fields::{FieldDef, FieldsContext};
use ulid::Ulid;

/// Look a field up by ULID, falling back to its key.
pub(crate) fn find_field<'a>(fields: &'a FieldsContext, key_or_id: &str) -> Result<&'a FieldDef> {
    Ulid::from_string(key_or_id)
        .ok()
        .and_then(|id| fields.get_field_by_id(&id))
        .or_else(|| fields.get_field_by_key(key_or_id))
        .ok_or_else(|| EngineError::FieldNotFound {
            id: key_or_id.to_string(),
        })
}

/// Validate a definition against its processor, its relation target and,
/// for lookups, the relation it reads through.
pub(crate) async fn check_definition(
    ctx: &EngineContext,
    fields: &FieldsContext,
    def: &FieldDef,
) -> Result<()> {
    ctx.registry().check_definition(def)?;

    if let Some(relation) = &def.relation {
        let target = DirectoryId::from(relation.target_directory_id.as_str());
        if !ctx.directory_exists(&target) {
            return Err(EngineError::DirectoryNotFound {
                id: target.to_string(),
            });
        }
        if let Some(display) = &relation.display_field_key {
            if ctx.fields(&target).await?.get_field_by_key(display).is_none() {
                return Err(EngineError::invalid_schema(
                    &def.key,
                    format!("display field '{display}' does not exist in the target directory"),
                ));
            }
        }
    }

    if let Some(lookup) = &def.lookup {
        let (relation_key, target_key) = lookup.parts().ok_or_else(|| {
            EngineError::invalid_schema(&def.key, "lookup source must be 'relation.key'")
        })?;
        let relation = fields
            .get_field_by_key(relation_key)
            .and_then(|f| f.relation.as_ref())
            .ok_or_else(|| {
                EngineError::invalid_schema(
                    &def.key,
                    format!("'{relation_key}' is not a relation field"),
                )
            })?;
        let target = DirectoryId::from(relation.target_directory_id.as_str());
        if ctx.fields(&target).await?.get_field_by_key(target_key).is_none() {
            return Err(EngineError::invalid_schema(
                &def.key,
                format!("'{target_key}' does not exist in the related directory"),
            ));
        }
    }

    Ok(())
}
