//! Record commands
//!
//! Writes are validated key by key against the directory's field
//! definitions. Updates are compare-and-swap on `version`: the caller names
//! the version it read and loses with a conflict if another write got there
//! first. Soft-deleted records are hidden from reads unless asked for.

mod create;
mod delete;
mod get;
mod list;
mod query;
mod restore;
mod update;
mod validate;

pub use create::CreateRecord;
pub use delete::DeleteRecord;
pub use get::GetRecord;
pub use list::ListRecords;
pub use restore::RestoreRecord;
pub use update::UpdateRecord;

use crate::context::EngineContext;
use crate::error::Result;
use crate::relation::RelationResolver;
use crate::types::Record;
use appgrid_fields::{FieldDef, FieldsContext};
use serde_json::Value;
use std::collections::BTreeSet;

/// JSON view of a record for a caller: props the caller may not read are
/// dropped, and `expand` attaches resolved relations and lookups.
pub(crate) async fn record_view(
    ctx: &EngineContext,
    fields: &FieldsContext,
    record: &Record,
    roles: Option<&BTreeSet<String>>,
    expand: bool,
) -> Result<Value> {
    let readable = |field: &FieldDef| roles.is_none_or(|roles| field.can_read(roles));

    let mut value = serde_json::to_value(record)?;
    if roles.is_some() {
        if let Some(props) = value.get_mut("props").and_then(Value::as_object_mut) {
            props.retain(|key, _| fields.get_field_by_key(key).is_none_or(readable));
        }
    }
    if expand {
        let expanded = RelationResolver::new(ctx)
            .expand(fields, record, readable)
            .await?;
        value["expanded"] = Value::Object(expanded);
    }
    Ok(value)
}
