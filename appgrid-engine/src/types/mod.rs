//! Core types for the record engine

mod category;
mod directory;
mod ids;
mod log;
mod migration;
mod query;
mod record;

pub use category::{
    CategoryNode, CategoryTree, FieldCategory, GENERAL_FIELD_CATEGORY, MAX_CATEGORY_DEPTH,
};
pub use directory::{Directory, DirectoryConfig, DirectoryKind, SortSpec};
pub(crate) use ids::is_path_safe;
pub use ids::{CategoryId, DirectoryId, FieldCategoryId, LogEntryId, RecordId};
pub use log::LogEntry;
pub use migration::{MigrationReport, MigrationStep, PendingMigration};
pub use query::{Pagination, RecordStatus, SortOrder};
pub use record::{Props, Record, CATEGORY_KEY};
