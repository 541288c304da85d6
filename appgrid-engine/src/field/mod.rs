//! Field definition commands
//!
//! Definition changes that affect stored values (key rename, type change,
//! delete) rewrite the directory's records one at a time and report the
//! outcome as a [`MigrationReport`](crate::types::MigrationReport). Records a
//! batch could not rewrite are kept as a pending migration; [`RetryMigration`]
//! finishes them.

mod create;
mod delete;
mod get;
mod list;
mod migrate;
mod retry;
mod schema;
mod update;

pub use create::CreateField;
pub use delete::DeleteField;
pub use get::GetField;
pub use list::ListFields;
pub use retry::{ListMigrations, RetryMigration};
pub use update::{FieldPatch, UpdateField};

pub(crate) use migrate::{apply_step, migrate_records, remember_failures};
pub(crate) use schema::find_field;
