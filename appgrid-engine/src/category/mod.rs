//! Record category tree commands
//!
//! Each directory with `supportsCategory` owns a forest of at most
//! [`MAX_CATEGORY_DEPTH`](crate::types::MAX_CATEGORY_DEPTH) levels. Records
//! store the node ids of their path under `$category`.

mod add;
mod get;
mod remove;
mod rename;

pub use add::AddCategory;
pub use get::GetCategoryTree;
pub use remove::RemoveCategory;
pub use rename::RenameCategory;

use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::types::{Directory, DirectoryId};

/// Read a directory, refusing those without record categories.
pub(crate) async fn category_directory(ctx: &EngineContext, id: &DirectoryId) -> Result<Directory> {
    let directory = ctx.read_directory(id).await?;
    if !directory.supports_category {
        return Err(EngineError::CategoriesDisabled {
            directory: id.to_string(),
        });
    }
    Ok(directory)
}
