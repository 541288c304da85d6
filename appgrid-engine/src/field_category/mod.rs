//! Field category commands
//!
//! Field categories group definitions for editing. Every directory has one
//! system category ("General") that new fields land in; it cannot be renamed
//! or deleted. Other categories can only be deleted once they are empty.

mod assign;
mod create;
mod delete;
mod list;
mod rename;

pub use assign::AssignFieldCategory;
pub use create::CreateFieldCategory;
pub use delete::DeleteFieldCategory;
pub use list::ListFieldCategories;
pub use rename::RenameFieldCategory;

use crate::context::EngineContext;
use crate::error::Result;
use crate::types::{DirectoryId, FieldCategory};
use appgrid_fields::FieldDef;
use tracing::warn;

/// The directory's system category, recreated if its file went missing.
pub(crate) async fn general_category(
    ctx: &EngineContext,
    directory: &DirectoryId,
) -> Result<FieldCategory> {
    let existing = ctx
        .read_all_field_categories(directory)
        .await?
        .into_iter()
        .find(|c| c.system);
    match existing {
        Some(category) => Ok(category),
        None => {
            warn!(directory = %directory, "system field category missing, recreating");
            let category = FieldCategory::general(directory.clone());
            ctx.write_field_category(&category).await?;
            Ok(category)
        }
    }
}

/// Add a field to a category.
pub(crate) async fn attach_field(
    ctx: &EngineContext,
    mut category: FieldCategory,
    field: &FieldDef,
) -> Result<()> {
    if category.field_ids.insert(field.id.to_string()) {
        ctx.write_field_category(&category).await?;
    }
    Ok(())
}

/// Remove a field from whichever categories list it.
pub(crate) async fn detach_field(
    ctx: &EngineContext,
    directory: &DirectoryId,
    field_id: &str,
) -> Result<()> {
    for mut category in ctx.read_all_field_categories(directory).await? {
        if category.field_ids.remove(field_id) {
            ctx.write_field_category(&category).await?;
        }
    }
    Ok(())
}
